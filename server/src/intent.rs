use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoProduct {
    pub name: &'static str,
    pub price: &'static str,
    pub availability: &'static str,
}

/// Simulated integration payload picked from the user's wording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentResult {
    OrderStatus {
        order_id: &'static str,
        status: &'static str,
        tracking: &'static str,
        estimated_delivery: &'static str,
    },
    ProductInfo {
        products: Vec<DemoProduct>,
    },
    Booking {
        available_slots: Vec<&'static str>,
        date: &'static str,
    },
    None,
}

impl IntentResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderStatus { .. } => "order_status",
            Self::ProductInfo { .. } => "product_info",
            Self::Booking { .. } => "booking",
            Self::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// Evaluated top to bottom; overlapping messages resolve to the first hit.
const ORDER_TERMS: [&str; 2] = ["order", "status"];
const PRODUCT_TERMS: [&str; 2] = ["product", "price"];
const BOOKING_TERMS: [&str; 2] = ["booking", "appointment"];

pub fn classify(message: &str) -> IntentResult {
    let lower = message.to_lowercase();
    let mentions = |terms: &[&str]| terms.iter().any(|needle| lower.contains(needle));

    if mentions(&ORDER_TERMS) {
        order_status_demo()
    } else if mentions(&PRODUCT_TERMS) {
        product_catalog_demo()
    } else if mentions(&BOOKING_TERMS) {
        booking_demo()
    } else {
        IntentResult::None
    }
}

fn order_status_demo() -> IntentResult {
    IntentResult::OrderStatus {
        order_id: "DEMO-2024-5678",
        status: "Shipped",
        tracking: "TRK987654321",
        estimated_delivery: "2-4 business days",
    }
}

fn product_catalog_demo() -> IntentResult {
    IntentResult::ProductInfo {
        products: vec![
            DemoProduct {
                name: "Product Alpha",
                price: "$49.99",
                availability: "In stock",
            },
            DemoProduct {
                name: "Product Beta",
                price: "$79.99",
                availability: "Low stock",
            },
            DemoProduct {
                name: "Product Gamma",
                price: "$129.99",
                availability: "Pre-order",
            },
        ],
    }
}

fn booking_demo() -> IntentResult {
    IntentResult::Booking {
        available_slots: vec!["10:00 AM", "2:00 PM", "4:30 PM"],
        date: "Tomorrow",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_keywords_win_over_every_other_category() {
        for message in [
            "Where is my ORDER?",
            "order and product prices please",
            "I need an appointment about my order",
            "status of my booking",
        ] {
            assert_eq!(classify(message).kind(), "order_status", "{message}");
        }
    }

    #[test]
    fn product_keywords_win_over_booking() {
        assert_eq!(
            classify("What is the price of a booking?").kind(),
            "product_info"
        );
        assert_eq!(classify("Show me your Products").kind(), "product_info");
    }

    #[test]
    fn booking_keywords_classify_as_booking() {
        let intent = classify("Can I make an Appointment tomorrow?");
        assert_eq!(
            intent,
            IntentResult::Booking {
                available_slots: vec!["10:00 AM", "2:00 PM", "4:30 PM"],
                date: "Tomorrow",
            }
        );
    }

    #[test]
    fn messages_without_keywords_have_no_intent() {
        assert!(classify("Hei! Hva kan du gjøre?").is_none());
        assert!(classify("").is_none());
    }

    #[test]
    fn keywords_match_inside_longer_words() {
        assert_eq!(classify("I'm reordering").kind(), "order_status");
        assert_eq!(classify("pricey stuff").kind(), "product_info");
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let value = serde_json::to_value(classify("show products")).expect("serializable");
        assert_eq!(value["type"], "product_info");
        assert_eq!(value["products"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["products"][0]["name"], "Product Alpha");
        assert_eq!(value["products"][2]["availability"], "Pre-order");
    }
}
