//! Keyword and primitive-type tables for Ralph.

/// Check if a name is a Ralph keyword.
pub fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "Contract"
            | "Interface"
            | "TxScript"
            | "Abstract"
            | "AssetScript"
            | "extends"
            | "implements"
            | "import"
            | "fn"
            | "pub"
            | "let"
            | "mut"
            | "return"
            | "if"
            | "else"
            | "while"
            | "for"
            | "emit"
            | "event"
            | "const"
            | "enum"
            | "struct"
            | "true"
            | "false"
            | "alph"
            | "mapping"
    )
}

/// Check if a name is a primitive Ralph type.
pub fn is_primitive_type(name: &str) -> bool {
    matches!(name, "U256" | "I256" | "Bool" | "ByteVec" | "Address")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_keyword() {
        assert!(is_keyword("Contract"));
        assert!(is_keyword("Interface"));
        assert!(is_keyword("TxScript"));
        assert!(is_keyword("extends"));
        assert!(is_keyword("implements"));
        assert!(is_keyword("fn"));
        assert!(is_keyword("pub"));
        assert!(is_keyword("let"));
        assert!(is_keyword("return"));
        assert!(is_keyword("emit"));
    }

    #[test]
    fn test_is_keyword_negative() {
        assert!(!is_keyword("foo"));
        assert!(!is_keyword("contract"));
        assert!(!is_keyword("U256"));
        assert!(!is_keyword(""));
    }

    #[test]
    fn test_is_primitive_type() {
        assert!(is_primitive_type("U256"));
        assert!(is_primitive_type("I256"));
        assert!(is_primitive_type("Bool"));
        assert!(is_primitive_type("ByteVec"));
        assert!(is_primitive_type("Address"));
    }

    #[test]
    fn test_is_primitive_type_negative() {
        assert!(!is_primitive_type("u256"));
        assert!(!is_primitive_type("Uint"));
        assert!(!is_primitive_type("MyContract"));
        assert!(!is_primitive_type(""));
    }
}
