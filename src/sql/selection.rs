//! Filter predicates: clause text with `?` placeholders plus positional args.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub clause: Option<String>,
    pub args: Vec<String>,
}

fn has_or(clause: &str) -> bool {
    clause
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word.eq_ignore_ascii_case("or"))
}

impl Selection {
    pub fn new(clause: impl Into<String>, args: Vec<String>) -> Self {
        Selection {
            clause: Some(clause.into()),
            args,
        }
    }

    /// No filter: every row.
    pub fn all() -> Self {
        Selection::default()
    }

    /// Clause text if present and not blank.
    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Returns `clause AND <column> = <id>`, or just `<column> = <id>` when there is no clause.
    /// Args are carried over unchanged. A clause containing `OR` is parenthesised first;
    /// one containing a `--` comment is also closed on a new line so the comment cannot swallow the scope.
    pub fn and_id(&self, column: &str, id: u64) -> Selection {
        let scope = format!("{} = {}", column, id);
        let clause = match self.clause() {
            None => scope,
            Some(existing) if existing.contains("--") => format!("({}\n) AND {}", existing, scope),
            Some(existing) if has_or(existing) => {
                format!("({}) AND {}", existing, scope)
            }
            Some(existing) => format!("{} AND {}", existing, scope),
        };
        Selection {
            clause: Some(clause),
            args: self.args.clone(),
        }
    }
}
