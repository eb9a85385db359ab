use bpt_assertions::gather;
use bpt_static::{ArtifactLocations, StaticConfig, StaticConfirmation};
use bpt_test_utils::{bar_app, bar_process, cocktail_process, write_source, BarAppFile};
use pretty_assertions::assert_eq;
use std::path::Path;

async fn confirm_bar(root: &Path, config: StaticConfig) -> Vec<String> {
    StaticConfirmation::new(ArtifactLocations::rooted(root))
        .with_config(config)
        .confirm(&gather(&bar_process()))
        .await
        .messages()
}

fn replace(root: &Path, file: BarAppFile, from: &str, to: &str) {
    let contents = file.contents().replace(from, to);
    assert_ne!(contents, file.contents(), "replacement did not apply");
    write_source(root, file.path(), &contents);
}

#[tokio::test]
async fn conforming_app_is_valid() {
    let app = bar_app();
    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert!(messages.is_empty(), "{messages:#?}");
}

#[tokio::test]
async fn missing_read_model_file() {
    let app = bar_app();
    std::fs::remove_file(app.path().join(BarAppFile::DrinkReadModel.path())).unwrap();

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["read model 'DrinkReadModel' not found at src/read-models/drink-read-model.ts"]
    );
}

#[tokio::test]
async fn trigger_authorization_must_cover_expected_roles() {
    let app = bar_app();
    replace(app.path(), BarAppFile::OrderCocktail, "authorize: [Guest]", "authorize: [Bartender]");

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["command 'OrderCocktail' authorizes [Bartender] but [Guest] is expected"]
    );
}

#[tokio::test]
async fn open_trigger_expected_but_restricted() {
    let app = bar_app();
    let assertions = gather(&cocktail_process());
    let messages = StaticConfirmation::new(ArtifactLocations::rooted(app.path()))
        .confirm(&assertions)
        .await
        .messages();
    assert_eq!(
        messages,
        vec!["command 'OrderCocktail' authorizes [Guest] but 'all' is expected"]
    );
}

#[tokio::test]
async fn correlation_field_is_required_on_trigger() {
    let app = bar_app();
    replace(
        app.path(),
        BarAppFile::OrderCocktail,
        "readonly drink: string, readonly tid?: UUID",
        "readonly drink: string",
    );

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["command 'OrderCocktail' does not declare the 'tid' correlation field"]
    );
}

#[tokio::test]
async fn optional_input_that_every_scenario_uses() {
    let app = bar_app();
    replace(app.path(), BarAppFile::OrderCocktail, "readonly drink: string", "readonly drink?: string");

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["command 'OrderCocktail' input 'drink' should be required"]
    );
}

#[tokio::test]
async fn undefined_role_and_missing_event() {
    let app = bar_app();
    replace(app.path(), BarAppFile::Roles, "export class Bartender {}", "");
    std::fs::remove_file(app.path().join(BarAppFile::BarOpened.path())).unwrap();

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec![
            "role 'Bartender' is not defined in src/roles.ts",
            "command 'OpenBar' registers 'BarOpened': event 'BarOpened' not found at src/events/bar-opened.ts",
        ]
    );
}

#[tokio::test]
async fn entity_fields_are_grouped() {
    let app = bar_app();
    replace(app.path(), BarAppFile::Drink, "    readonly orderedAt: string,\n", "");

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["entity 'Drink': field 'orderedAt' is not declared"]
    );
}

#[tokio::test]
async fn read_model_projection_wiring() {
    let app = bar_app();
    replace(app.path(), BarAppFile::DrinkReadModel, "@Projects(Drink, 'id')", "@Projects(Tab, 'id')");

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["read model 'DrinkReadModel' projects 'Tab' which no scenario expects to change"]
    );
}

const MIX_DRINK: &str = r"
@EventHandler(CocktailOrdered)
export class MixDrink {
  public static async handle(event: CocktailOrdered, register: Register): Promise<void> {
    register.events(new DrinkMixed(event.tid, event.drink, event.orderedAt))
  }
}
";

#[tokio::test]
async fn event_path_respects_hop_limit() {
    let app = bar_app();
    write_source(app.path(), "src/event-handlers/mix-drink.ts", MIX_DRINK);
    replace(
        app.path(),
        BarAppFile::PourDrink,
        "@EventHandler(CocktailOrdered)",
        "@EventHandler(DrinkMixed)",
    );

    let one_hop = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        one_hop,
        vec!["no event path from trigger 'OrderCocktail' to entity 'Drink' within 1 handler hop(s)"]
    );

    let two_hops = confirm_bar(app.path(), StaticConfig::default().with_max_handler_hops(2)).await;
    assert!(two_hops.is_empty(), "{two_hops:#?}");
}

#[tokio::test]
async fn missing_trigger_skips_its_checks() {
    let app = bar_app();
    std::fs::remove_file(app.path().join(BarAppFile::OrderCocktail.path())).unwrap();

    let messages = confirm_bar(app.path(), StaticConfig::default()).await;
    assert_eq!(
        messages,
        vec!["command 'OrderCocktail' not found at src/commands/order-cocktail.ts"]
    );
}
