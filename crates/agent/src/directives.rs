//! Deterministic parsing of explicit operator commands.
//!
//! Requests like `restock SKU123 200` don't need a model round-trip; they
//! resolve straight to a capability. Anything that doesn't match falls
//! through to the LLM selection path.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveMatch {
    pub tool: &'static str,
    pub input: String,
}

pub fn parse_directive(text: &str) -> Option<DirectiveMatch> {
    let trimmed = text.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let verb = tokens.first()?.to_ascii_lowercase();

    match verb.as_str() {
        // The restock tool owns argument validation, so malformed commands
        // still route to it and come back with a usage message.
        "restock" => Some(DirectiveMatch {
            tool: "restock_order",
            input: tokens[1..].join(" "),
        }),
        "forecast" => {
            if tokens.len() == 1 {
                Some(DirectiveMatch { tool: "forecast_summary", input: String::new() })
            } else {
                Some(DirectiveMatch { tool: "forecast_lookup", input: tokens[1..].join(" ") })
            }
        }
        "cross-sell" | "crosssell" => {
            Some(DirectiveMatch { tool: "cross_sell", input: tokens[1..].join(" ") })
        }
        "cross" if tokens.get(1).is_some_and(|token| token.eq_ignore_ascii_case("sell")) => {
            Some(DirectiveMatch { tool: "cross_sell", input: tokens[2..].join(" ") })
        }
        "price" => {
            let rest = if tokens.get(1).is_some_and(|token| token.eq_ignore_ascii_case("check")) {
                &tokens[2..]
            } else {
                &tokens[1..]
            };
            Some(DirectiveMatch { tool: "price_check", input: rest.join(" ") })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_directive;

    #[test]
    fn restock_command_routes_with_raw_arguments() {
        let matched = parse_directive("restock SKU123 200").expect("directive");
        assert_eq!(matched.tool, "restock_order");
        assert_eq!(matched.input, "SKU123 200");
    }

    #[test]
    fn bare_forecast_is_the_summary() {
        let matched = parse_directive("forecast").expect("directive");
        assert_eq!(matched.tool, "forecast_summary");
        assert!(matched.input.is_empty());
    }

    #[test]
    fn forecast_with_sku_is_a_lookup() {
        let matched = parse_directive("Forecast SKU-ANVIL").expect("directive");
        assert_eq!(matched.tool, "forecast_lookup");
        assert_eq!(matched.input, "SKU-ANVIL");
    }

    #[test]
    fn cross_sell_spellings_all_match() {
        for text in ["cross-sell SKU1", "cross sell SKU1", "crosssell SKU1"] {
            let matched = parse_directive(text).expect("directive");
            assert_eq!(matched.tool, "cross_sell");
            assert_eq!(matched.input, "SKU1");
        }
    }

    #[test]
    fn price_check_accepts_both_forms() {
        assert_eq!(parse_directive("price P-1").expect("directive").input, "P-1");
        assert_eq!(parse_directive("price check P-1").expect("directive").input, "P-1");
    }

    #[test]
    fn free_text_does_not_match() {
        assert!(parse_directive("which skus are running hot this week?").is_none());
        assert!(parse_directive("").is_none());
    }
}
