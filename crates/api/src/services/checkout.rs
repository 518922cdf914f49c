//! Checkout deep link.
//!
//! Checkout hands the order to the shop over WhatsApp: the cart summary is
//! rendered into a plain-text message and URL-encoded into a `wa.me` link.
//! Nothing is written to the store.

use std::fmt::Write as _;

use crate::models::{CartCheckout, CartSummary};

const WHATSAPP_BASE: &str = "https://wa.me";

/// Render the order message for `customer_name`.
#[must_use]
pub fn checkout_message(customer_name: &str, summary: &CartSummary) -> String {
    let mut message =
        format!("¡Hola! Soy {customer_name} y quiero realizar el siguiente pedido:\n\n");

    for (index, line) in summary.lines.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = write!(
            message,
            "{}. {}\n   Cantidad: {}\n   Precio unitario: {}\n   Subtotal: {}\n\n",
            index + 1,
            line.product.name,
            line.quantity,
            line.unit_price,
            line.line_total,
        );
    }

    let _ = write!(message, "Total: {}\n\n", summary.subtotal);
    message.push_str("Por favor, confírmame la disponibilidad y el proceso de pago. ¡Gracias!");
    message
}

/// Build the `wa.me` link. Without a phone number WhatsApp lets the user
/// pick the recipient.
#[must_use]
pub fn checkout_link(phone: Option<&str>, message: &str) -> String {
    format!(
        "{WHATSAPP_BASE}/{}?text={}",
        phone.unwrap_or_default(),
        urlencoding::encode(message)
    )
}

/// Message and link for a non-empty cart summary.
#[must_use]
pub fn build_checkout(phone: Option<&str>, customer_name: &str, summary: &CartSummary) -> CartCheckout {
    let message = checkout_message(customer_name, summary);
    CartCheckout {
        url: checkout_link(phone, &message),
        message,
        total: summary.subtotal,
    }
}
