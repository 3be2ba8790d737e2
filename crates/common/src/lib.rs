#![forbid(unsafe_code)]

pub mod sql {
    #[must_use]
    pub fn quote_literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Joins SQL fragments with `,` and no padding, matching how generated
    /// column and parameter lists are rendered.
    #[must_use]
    pub fn join_list<I, S>(items: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        for (idx, item) in items.into_iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(item.as_ref());
        }
        out
    }

    #[must_use]
    pub fn name_type_pair(name: &str, sql_type: &str) -> String {
        format!("{name} {sql_type}")
    }
}

pub mod settings {
    /// Reads a flag the way Postgres reads a `boolean` literal: `on`, `off`,
    /// `1`, `0`, or any leading part of `true`, `false`, `yes` and `no`.
    #[must_use]
    pub fn parse_bool_setting(value: &str) -> Option<bool> {
        let word = value.trim().to_ascii_lowercase();
        if word.is_empty() {
            return None;
        }
        let abbreviates = |full: &str| full.starts_with(word.as_str());

        match word.as_str() {
            "1" | "on" => Some(true),
            "0" | "of" | "off" => Some(false),
            _ if abbreviates("true") || abbreviates("yes") => Some(true),
            _ if abbreviates("false") || abbreviates("no") => Some(false),
            _ => None,
        }
    }
}
