//! Plain stdout rendering: aligned-column tables for plans, preferences,
//! and shopping lists.

use chrono::{DateTime, Utc};
use platter_core::cart::CartReceipt;
use platter_store::{MealDay, MealPlan, ShoppingListItem};

/// Print an aligned table. Column widths come from the widest cell.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let print_row = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .take(columns)
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        println!("  {}", line.join("  ").trim_end());
    };

    print_row(&headers.iter().map(|h| (*h).to_owned()).collect::<Vec<_>>());
    let total: usize = widths.iter().sum::<usize>() + 2 * (columns - 1);
    println!("  {}", "-".repeat(total));
    for row in rows {
        print_row(row);
    }
}

fn short_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Print a full plan as a table plus the week header.
pub fn print_meal_plan(plan: &MealPlan) {
    println!("Meal plan for week starting {}", short_date(plan.week_starting));
    println!();

    let rows: Vec<Vec<String>> = plan
        .days
        .iter()
        .map(|day| {
            vec![
                day.day.to_string(),
                day.meal.clone(),
                format!("{} min", day.recipe.cooking_time_minutes),
                if day.contains_oily_fish { "yes" } else { "" }.to_owned(),
                if day.is_remixed { "yes" } else { "" }.to_owned(),
            ]
        })
        .collect();
    print_table(&["Day", "Meal", "Time", "Oily fish", "Remix"], &rows);
}

/// Print one day's recipe: description, ingredients, numbered steps.
pub fn print_recipe(day: &MealDay) {
    println!("{}: {}", day.day, day.meal);
    if !day.description.is_empty() {
        println!("{}", day.description);
    }
    println!(
        "Cooking time: {} minutes",
        day.recipe.cooking_time_minutes
    );
    println!();

    println!("Ingredients:");
    for ingredient in &day.ingredients {
        if ingredient.unit.is_empty() {
            println!("  - {} {}", trim_quantity(ingredient.quantity), ingredient.name);
        } else {
            println!(
                "  - {} {} {}",
                trim_quantity(ingredient.quantity),
                ingredient.unit,
                ingredient.name
            );
        }
    }

    println!();
    println!("Instructions:");
    for (i, step) in day.recipe.instructions.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    if let Some(source) = &day.recipe.source {
        println!();
        println!("Source: {source}");
    }
}

/// Print a plan history listing.
pub fn print_history(history: &[MealPlan]) {
    for (i, plan) in history.iter().enumerate() {
        println!(
            "Week {} (starting {}) -- {}",
            i + 1,
            short_date(plan.week_starting),
            plan.id
        );
        for day in &plan.days {
            let fish = if day.contains_oily_fish { " [oily fish]" } else { "" };
            println!("  {}: {}{}", day.day, day.meal, fish);
        }
    }
}

/// Print a shopping list grouped by category.
pub fn print_shopping_list(items: &[ShoppingListItem]) {
    let mut current_category = "";
    for item in items {
        if item.category != current_category {
            current_category = &item.category;
            println!("{current_category}:");
        }
        let quantity = trim_quantity(item.quantity);
        if item.unit.is_empty() {
            println!("  - {} x{}", item.name, quantity);
        } else {
            println!("  - {} ({} {})", item.name, quantity, item.unit);
        }
    }
}

/// Print a cart-submission receipt.
pub fn print_receipt(receipt: &CartReceipt) {
    println!("Added {} item(s) to the cart:", receipt.added.len());
    let rows: Vec<Vec<String>> = receipt
        .added
        .iter()
        .map(|line| {
            vec![
                line.name.clone(),
                line.product_name.clone(),
                format!("{:.2}", line.price),
            ]
        })
        .collect();
    print_table(&["Item", "Product", "Price"], &rows);

    if !receipt.missing.is_empty() {
        println!();
        println!("Not matched: {}", receipt.missing.join(", "));
    }
    println!();
    println!("Total: {:.2}", receipt.total_price);
    println!("Cart: {}", receipt.cart_url);
}

/// Format a quantity without a trailing `.0` for whole numbers.
fn trim_quantity(quantity: f64) -> String {
    if (quantity - quantity.round()).abs() < 1e-9 {
        format!("{}", quantity.round() as i64)
    } else {
        format!("{quantity:.2}")
    }
}
