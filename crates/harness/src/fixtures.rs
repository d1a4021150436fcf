//! Catalog documents shared by the integration suites.

use serde_json::{Value, json};

/// The minimal two-card catalog: "2024 Topps" / "Base" with cards #1 Alice and
/// #2 Bob, parallels Base and Gold, one location tag.
pub fn scenario_catalog() -> Value {
    json!({
        "products": [{
            "sport": "Baseball",
            "year": 2024,
            "name": "2024 Topps",
            "sets": [{
                "name": "Base",
                "cards": [
                    {"number": "1", "player": "Alice"},
                    {"number": "2", "player": "Bob"}
                ],
                "parallels": [
                    {"name": "Base", "is_base": true},
                    {"name": "Gold"}
                ]
            }]
        }],
        "tags": {"location": ["Box A"]}
    })
}

/// A fuller catalog: two sports, several sets with overlapping parallels, a
/// set with no parallels, every tag kind and some prior ownership.
pub fn sample_catalog() -> Value {
    json!({
        "exported_at": "2024-11-02T18:30:00Z",
        "products": [
            {
                "sport": "Baseball",
                "year": 2024,
                "name": "2024 Topps",
                "sets": [
                    {
                        "name": "Base",
                        "type": "base",
                        "cards": [
                            {"number": 1, "player": "Alice", "team": "Cubs", "rookie": true},
                            {"number": "2", "player": "Bob", "team": "Mets"},
                            {"number": "3", "card_name": "Team Checklist"}
                        ],
                        "parallels": [
                            {"name": "Base", "is_base": true},
                            {"name": "Gold", "serial_numbered": 2024, "color_hex": "#d4af37"},
                            {"name": "Rainbow Foil"}
                        ]
                    },
                    {
                        "name": "Inserts",
                        "type": "insert",
                        "cards": [
                            {"number": "I-1", "player": "Carol", "sp": true}
                        ],
                        "parallels": [
                            {"name": "Base", "is_base": true},
                            {"name": "Black", "serial_numbered": 1}
                        ]
                    },
                    {
                        "name": "Autographs",
                        "type": "auto",
                        "cards": [
                            {"number": "A-1", "player": "Dan"}
                        ],
                        "parallels": [
                            {"name": "Red", "serial_numbered": 5},
                            {"name": "Gold", "serial_numbered": 10}
                        ]
                    },
                    {
                        "name": "Promos",
                        "cards": [
                            {"number": "P-1", "player": "Eve"}
                        ],
                        "parallels": []
                    }
                ]
            },
            {
                "sport": "Baseball",
                "year": 2023,
                "name": "2023 Bowman",
                "sets": [{
                    "name": "Base",
                    "cards": [{"number": "10", "player": "Frank"}],
                    "parallels": [{"name": "Base", "is_base": true}]
                }]
            },
            {
                "sport": "Basketball",
                "year": "2024",
                "name": "2024 Prizm",
                "sets": [{
                    "name": "Base",
                    "cards": [{"number": "7", "player": "Grace"}],
                    "parallels": [{"name": "Silver", "is_base": true}]
                }]
            }
        ],
        "tags": {
            "location": [
                {"name": "Box A", "color_hex": "#336699"},
                "Box B",
                "Binder 1"
            ],
            "price_bucket": ["$1-5", "$5-20", "$20+"],
            "status": ["Keep", "Sell", "Trade"]
        },
        "collection": [
            {"product": "2024 Topps", "set": "Base", "card_number": 1, "quantity": 2, "median_price": 1.5},
            {"product": "2024 Topps", "set": "Base", "card_number": "1", "quantity": 1, "median_price": 3.0, "grade": "PSA 9"},
            {"product": "2024 Topps", "set": "Inserts", "card_number": "I-1", "grade": "Raw"}
        ]
    })
}

pub fn scenario_catalog_json() -> String {
    scenario_catalog().to_string()
}

pub fn sample_catalog_json() -> String {
    sample_catalog().to_string()
}
