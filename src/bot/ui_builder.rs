//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    ReplyMarkup,
};

use crate::localization::{t, t_args};
use crate::products::{Product, CATEGORIES};

/// Reply keyboard with a single location-request button
pub fn location_request_keyboard() -> ReplyMarkup {
    let button = KeyboardButton::new(t("button-share-location")).request(ButtonRequest::Location);
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![vec![button]])
            .resize_keyboard()
            .one_time_keyboard(),
    )
}

/// Inline keyboard with one button per category, two per row.
/// The callback data is the category name itself.
pub fn category_keyboard() -> ReplyMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = CATEGORIES
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|category| InlineKeyboardButton::callback(*category, *category))
                .collect()
        })
        .collect();

    ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
}

/// Format a price with at most two decimals, dropping a zero fraction
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}

/// Format products as a numbered Markdown list
pub fn format_product_list(query: &str, products: &[Product]) -> String {
    let mut result = t_args("products-header", &[("query", query)]);
    result.push_str("\n\n");

    for (i, product) in products.iter().enumerate() {
        let title = match &product.url {
            Some(url) => format!("[{}]({})", product.title, url),
            None => format!("*{}*", product.title),
        };
        let price = t_args(
            "product-price",
            &[
                ("price", &format_price(product.price)),
                ("currency", &product.currency),
            ],
        );

        result.push_str(&format!(
            "{}. {}\n{}\n{}\n\n",
            i + 1,
            title,
            price,
            product.description
        ));
    }

    result.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(title: &str, price: f64, currency: &str) -> Product {
        Product {
            title: title.to_string(),
            url: Some(format!("https://example.com/{title}")),
            description: format!("{title} - a fine product"),
            price,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_format_product_list_numbers_entries() {
        let list = format_product_list(
            "Electronics",
            &[product("Laptop", 1299.5, "USD"), product("Phone", 100.0, "USD")],
        );

        assert!(list.contains("*Electronics*"));
        assert!(list.contains("1. [Laptop](https://example.com/Laptop)"));
        assert!(list.contains("💰 1299.50 USD"));
        assert!(list.contains("2. [Phone](https://example.com/Phone)"));
        assert!(list.contains("💰 100 USD"));
        assert!(list.contains("Phone - a fine product"));
    }

    #[test]
    fn test_category_keyboard_has_every_category() {
        let ReplyMarkup::InlineKeyboard(markup) = category_keyboard() else {
            panic!("expected inline keyboard");
        };
        let labels: Vec<String> = markup
            .inline_keyboard
            .iter()
            .flatten()
            .map(|button| button.text.clone())
            .collect();
        assert_eq!(labels, CATEGORIES.to_vec());
    }

    #[test]
    fn test_location_keyboard_requests_location() {
        let ReplyMarkup::Keyboard(markup) = location_request_keyboard() else {
            panic!("expected reply keyboard");
        };
        assert_eq!(markup.keyboard.len(), 1);
        assert_eq!(markup.keyboard[0][0].request, Some(ButtonRequest::Location));
    }
}
