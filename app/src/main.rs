//! `larder`: log in and print the pantry, recipes and shopping list.
//!
//! ```text
//! larder            restore the stored session (or log in) and print everything
//! larder logout     forget the stored token
//! ```
//!
//! Credentials come from `LARDER_USERNAME` and `LARDER_PASSWORD` when no
//! token is stored.

use anyhow::Context;
use larder_app::{App, AppConfig, View};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SETTLE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let mut app = App::from_config(&config)?;

    let restored = app.restore().await?;

    if std::env::args().nth(1).as_deref() == Some("logout") {
        app.logout().await?;
        println!("Logged out.");
        return Ok(());
    }

    if !restored {
        let username = std::env::var("LARDER_USERNAME").context("LARDER_USERNAME is not set")?;
        let password = std::env::var("LARDER_PASSWORD").context("LARDER_PASSWORD is not set")?;
        app.login(&username, &password).await?;
    }

    print_pantry(&mut app).await?;
    print_recipes(&mut app).await?;
    print_shopping_list(&mut app).await?;
    Ok(())
}

async fn print_pantry(app: &mut App) -> anyhow::Result<()> {
    app.navigate(View::Pantry).await?;
    let Some(pantry) = app.pantry() else {
        return Ok(());
    };
    pantry.settle(SETTLE).await?;

    println!("== {} ==", View::Pantry.title());
    pantry
        .state(|state| {
            if let Some(notice) = state.notice.message() {
                println!("! {notice}");
            }
            for section in &state.sections {
                println!("{} {}", section.category.icon, section.category.name);
                for item in &section.items.items {
                    println!(
                        "  {:<24} {:>6} {} {} ({} on hand)",
                        item.name,
                        item.capacity,
                        item.capacity_measure.as_str(),
                        item.container.as_str(),
                        item.on_hand
                    );
                }
            }
        })
        .await;
    Ok(())
}

async fn print_recipes(app: &mut App) -> anyhow::Result<()> {
    app.navigate(View::Recipes).await?;
    let Some(recipes) = app.recipes() else {
        return Ok(());
    };
    recipes.settle(SETTLE).await?;

    println!("\n== {} ==", View::Recipes.title());
    recipes
        .state(|state| {
            if let Some(notice) = state.recipes.notice.message() {
                println!("! {notice}");
            }
            for recipe in &state.recipes.items {
                println!("  {:<32} serves {}", recipe.name, recipe.serves);
            }
        })
        .await;
    Ok(())
}

async fn print_shopping_list(app: &mut App) -> anyhow::Result<()> {
    app.navigate(View::ShoppingList).await?;
    let Some(list) = app.shopping_list() else {
        return Ok(());
    };
    list.settle(SETTLE).await?;

    println!("\n== {} ==", View::ShoppingList.title());
    list.state(|state| {
        if let Some(notice) = state.items.notice.message() {
            println!("! {notice}");
        }
        for entry in &state.items.items {
            let mark = if entry.is_checked { "x" } else { " " };
            println!("  [{mark}] {:<24} {}", entry.pantry_item.name, entry.quantity);
        }
    })
    .await;
    Ok(())
}
