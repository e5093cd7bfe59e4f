//! Payment form state for the last checkout step.

use std::sync::LazyLock;

use regex::Regex;
use validator::Validate;

use crate::domain::{PaymentMethod, PaymentMethodType};

static CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4} \d{4} \d{4} \d{4}$").expect("valid card pattern"));
static EXPIRATION_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("valid expiration pattern"));
static CVV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("valid cvv pattern"));

#[derive(Clone, Debug, Default, PartialEq, Eq, Validate)]
pub struct PaymentForm {
    pub method: PaymentMethodType,
    #[validate(regex(path = "CARD_NUMBER", message = "Enter a 16-digit card number"))]
    pub card_number: String,
    #[validate(length(min = 1, message = "Name on card is required"))]
    pub name_on_card: String,
    #[validate(regex(path = "EXPIRATION_DATE", message = "Enter the expiration as MM/YY"))]
    pub expiration_date: String,
    #[validate(regex(path = "CVV", message = "Enter the 3 or 4 digit security code"))]
    pub cvv: String,
}

impl PaymentForm {
    pub fn clear_card(&mut self) {
        self.card_number.clear();
        self.name_on_card.clear();
        self.expiration_date.clear();
        self.cvv.clear();
    }

    /// Wire form of the selected method; card fields travel only with a card.
    pub fn to_payment_method(&self) -> PaymentMethod {
        match self.method {
            PaymentMethodType::CreditCard => PaymentMethod::CreditCard {
                card_number: self.card_number.clone(),
                name_on_card: self.name_on_card.clone(),
                expiration_date: self.expiration_date.clone(),
                cvv: self.cvv.clone(),
            },
            PaymentMethodType::PayPal => PaymentMethod::PayPal,
            PaymentMethodType::ApplePay => PaymentMethod::ApplePay,
            PaymentMethodType::GooglePay => PaymentMethod::GooglePay,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn valid_card() -> PaymentForm {
        PaymentForm {
            method: PaymentMethodType::CreditCard,
            card_number: "4111 1111 1111 1111".into(),
            name_on_card: "Ada Lovelace".into(),
            expiration_date: "12/29".into(),
            cvv: "123".into(),
        }
    }
}
