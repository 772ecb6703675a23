// sql guard - screens caller-supplied fragments before interpolation
// catches obvious dangerous stuff but not everything

use crate::Error;

pub struct Guard;

impl Guard {
    /// Check a free-form sql fragment (where clause, order by) that will be
    /// spliced into a query. Rejects anything that could escape the clause.
    pub fn check_fragment(fragment: &str) -> Result<(), Error> {
        let upper = fragment.to_uppercase();

        // these can't appear in a predicate at all
        let forbidden = [
            (";", "statement terminator in fragment"),
            ("--", "sql comment in fragment"),
            ("/*", "sql comment in fragment"),
        ];

        for (pattern, reason) in forbidden {
            if upper.contains(pattern) {
                return Err(Error::BadRequest(reason.to_string()));
            }
        }

        // keyword check is word-wise so column names like updated_at pass
        let dangerous = [
            "DROP", "TRUNCATE", "ALTER", "DELETE", "UPDATE", "INSERT", "GRANT", "REVOKE",
            "CREATE",
        ];

        for word in upper.split(|c: char| !c.is_alphanumeric() && c != '_') {
            if dangerous.contains(&word) {
                return Err(Error::BadRequest(format!(
                    "{word} not allowed in fragment"
                )));
            }
        }

        Ok(())
    }

    /// Quote a table or column name for interpolation. Embedded quotes and
    /// control characters are rejected rather than escaped.
    pub fn quote_ident(name: &str) -> Result<String, Error> {
        if name.is_empty() {
            return Err(Error::BadRequest("empty identifier".to_string()));
        }

        if name.contains('"') || name.contains(';') || name.contains('\0') {
            return Err(Error::BadRequest(format!("invalid identifier: {name}")));
        }

        Ok(format!("\"{name}\""))
    }
}
