//! Macros for ergonomic context and patch construction.

/// Build a [`crate::core::ContextPatch`] from a JSON object body.
///
/// The body is handed to `serde_json::json!`, so JSON literals (`null`,
/// nested objects, arrays) and interpolated Rust expressions both work.
/// A repeated field keeps its last value, matching the last-write-wins
/// patch semantics; use [`crate::core::ContextPatch::set`] when explicit
/// entry ordering matters.
///
/// # Example
///
/// ```rust
/// use strata::patch;
///
/// let p = patch! {
///     "error": "",
///     "isCreateNewWallet": true,
///     "selectedWallet": null,
/// };
/// assert_eq!(p.entries().len(), 3);
///
/// let empty = patch! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! patch {
    () => {
        $crate::core::ContextPatch::new()
    };
    ($($body:tt)+) => {
        $crate::core::ContextPatch::from_object(::serde_json::json!({ $($body)+ }))
    };
}

/// Build a [`crate::core::Context`] from a JSON object body.
///
/// # Example
///
/// ```rust
/// use strata::context;
/// use serde_json::json;
///
/// let ctx = context! {
///     "credentials": {},
///     "selectedWallet": null,
/// };
/// assert_eq!(ctx.get("credentials"), Some(&json!({})));
/// assert_eq!(ctx.get("selectedWallet"), Some(&json!(null)));
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::core::Context::new()
    };
    ($($body:tt)+) => {
        $crate::core::Context::from_object(::serde_json::json!({ $($body)+ }))
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn patch_macro_accepts_json_literals_and_expressions() {
        let attempts = 2;
        let p = patch! {
            "error": null,
            "attempts": attempts + 1,
            "nested": { "flag": true },
        };

        let entries = p.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&("error".to_string(), json!(null))));
        assert!(entries.contains(&("attempts".to_string(), json!(3))));
        assert!(entries.contains(&("nested".to_string(), json!({ "flag": true }))));
    }

    #[test]
    fn context_macro_builds_nested_values() {
        let ctx = context! {
            "credentials": { "rpc_user": "user" },
            "isSPV": null,
        };
        assert_eq!(
            ctx.get("credentials"),
            Some(&json!({ "rpc_user": "user" }))
        );
        assert!(!ctx.flag("isSPV"));
    }

    #[test]
    fn repeated_fields_keep_the_last_value() {
        let p = patch! {
            "error": "first",
            "error": "second",
        };
        assert_eq!(p.entries(), &[("error".to_string(), json!("second"))]);
    }

    #[test]
    fn empty_macros_build_empty_values() {
        assert!(patch! {}.is_empty());
        assert!(context! {}.is_empty());
    }
}
