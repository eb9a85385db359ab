use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Files of the generated bar application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarAppFile {
    Roles,
    OrderCocktail,
    OpenBar,
    CocktailOrdered,
    BarOpened,
    DrinkPoured,
    PourDrink,
    Drink,
    DrinkReadModel,
}

impl BarAppFile {
    pub const ALL: [BarAppFile; 9] = [
        Self::Roles,
        Self::OrderCocktail,
        Self::OpenBar,
        Self::CocktailOrdered,
        Self::BarOpened,
        Self::DrinkPoured,
        Self::PourDrink,
        Self::Drink,
        Self::DrinkReadModel,
    ];

    /// Path relative to the application root
    pub fn path(self) -> &'static str {
        match self {
            Self::Roles => "src/roles.ts",
            Self::OrderCocktail => "src/commands/order-cocktail.ts",
            Self::OpenBar => "src/commands/open-bar.ts",
            Self::CocktailOrdered => "src/events/cocktail-ordered.ts",
            Self::BarOpened => "src/events/bar-opened.ts",
            Self::DrinkPoured => "src/events/drink-poured.ts",
            Self::PourDrink => "src/event-handlers/pour-drink.ts",
            Self::Drink => "src/entities/drink.ts",
            Self::DrinkReadModel => "src/read-models/drink-read-model.ts",
        }
    }

    pub fn contents(self) -> &'static str {
        match self {
            Self::Roles => ROLES,
            Self::OrderCocktail => ORDER_COCKTAIL,
            Self::OpenBar => OPEN_BAR,
            Self::CocktailOrdered => COCKTAIL_ORDERED,
            Self::BarOpened => BAR_OPENED,
            Self::DrinkPoured => DRINK_POURED,
            Self::PourDrink => POUR_DRINK,
            Self::Drink => DRINK,
            Self::DrinkReadModel => DRINK_READ_MODEL,
        }
    }
}

/// Write (or overwrite) one source file below `root`
pub fn write_source(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Write the full bar application below `root`
pub fn write_bar_app(root: &Path) {
    for file in BarAppFile::ALL {
        write_source(root, file.path(), file.contents());
    }
}

/// Bar application in a fresh temporary directory
pub fn bar_app() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_bar_app(dir.path());
    dir
}

const ROLES: &str = r"import { Role } from '@boostercloud/framework-core'

@Role({
  auth: { signUpMethods: ['email'] },
})
export class Guest {}

@Role({
  auth: { signUpMethods: ['email'] },
})
export class Bartender {}
";

const ORDER_COCKTAIL: &str = r"import { Command } from '@boostercloud/framework-core'
import { Register, UUID } from '@boostercloud/framework-types'
import { Guest } from '../roles'
import { CocktailOrdered } from '../events/cocktail-ordered'

@Command({
  authorize: [Guest],
})
export class OrderCocktail {
  public constructor(readonly drink: string, readonly tid?: UUID) {}

  public static async handle(command: OrderCocktail, register: Register): Promise<void> {
    if (!command.drink) {
      throw new InvalidParameterError('drink is required')
    }
    const orderedAt = new Date().toISOString()
    register.events(new CocktailOrdered(command.tid ?? UUID.generate(), command.drink, orderedAt))
  }
}
";

const OPEN_BAR: &str = r"import { Command } from '@boostercloud/framework-core'
import { Register, UUID } from '@boostercloud/framework-types'
import { Bartender } from '../roles'
import { BarOpened } from '../events/bar-opened'

@Command({
  authorize: [Bartender],
})
export class OpenBar {
  public constructor(readonly bar: string, readonly tid?: UUID) {}

  public static async handle(command: OpenBar, register: Register): Promise<void> {
    register.events(new BarOpened(command.tid ?? UUID.generate(), command.bar))
  }
}
";

const COCKTAIL_ORDERED: &str = r"import { Event } from '@boostercloud/framework-core'
import { UUID } from '@boostercloud/framework-types'

@Event
export class CocktailOrdered {
  public constructor(readonly tid: UUID, readonly drink: string, readonly orderedAt: string) {}

  public entityID(): UUID {
    return this.tid
  }
}
";

const BAR_OPENED: &str = r"import { Event } from '@boostercloud/framework-core'
import { UUID } from '@boostercloud/framework-types'

@Event
export class BarOpened {
  public constructor(readonly tid: UUID, readonly bar: string) {}

  public entityID(): UUID {
    return this.tid
  }
}
";

const DRINK_POURED: &str = r"import { Event } from '@boostercloud/framework-core'
import { UUID } from '@boostercloud/framework-types'

@Event
export class DrinkPoured {
  public constructor(readonly tid: UUID, readonly drink: string, readonly orderedAt: string) {}

  public entityID(): UUID {
    return this.tid
  }
}
";

const POUR_DRINK: &str = r"import { EventHandler } from '@boostercloud/framework-core'
import { Register } from '@boostercloud/framework-types'
import { CocktailOrdered } from '../events/cocktail-ordered'
import { DrinkPoured } from '../events/drink-poured'

@EventHandler(CocktailOrdered)
export class PourDrink {
  public static async handle(event: CocktailOrdered, register: Register): Promise<void> {
    const drink = event.drink.charAt(0).toUpperCase() + event.drink.slice(1)
    register.events(new DrinkPoured(event.tid, drink, event.orderedAt))
  }
}
";

const DRINK: &str = r"import { Entity, Reduces } from '@boostercloud/framework-core'
import { UUID } from '@boostercloud/framework-types'
import { DrinkPoured } from '../events/drink-poured'

@Entity
export class Drink {
  public constructor(
    readonly id: UUID,
    readonly drink: string,
    readonly orderedAt: string,
    readonly served: boolean,
  ) {}

  @Reduces(DrinkPoured)
  public static reduceDrinkPoured(event: DrinkPoured, currentDrink?: Drink): Drink {
    return new Drink(event.tid, event.drink, event.orderedAt, false)
  }
}
";

const DRINK_READ_MODEL: &str = r"import { ReadModel, Projects } from '@boostercloud/framework-core'
import { ProjectionResult, UUID } from '@boostercloud/framework-types'
import { Guest } from '../roles'
import { Drink } from '../entities/drink'

@ReadModel({
  authorize: [Guest],
})
export class DrinkReadModel {
  public constructor(readonly id: UUID, readonly drink: string) {}

  @Projects(Drink, 'id')
  public static projectDrink(entity: Drink, current?: DrinkReadModel): ProjectionResult<DrinkReadModel> {
    return new DrinkReadModel(entity.id, entity.drink)
  }
}
";
