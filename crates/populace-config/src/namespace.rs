//! Namespace inference for entity kinds.
//!
//! Entity kinds contributed by add-ons are named `<namespace>.<Name>`; their
//! overrides are stored in a document of their own so that each add-on's
//! settings can be edited (or deleted) independently.

/// Namespace used for entity kinds without a usable prefix.
pub const BUILTIN_NAMESPACE: &str = "Vanilla";

/// Infer the store namespace for an entity kind.
///
/// The namespace is the part of `entity_kind` before the first `.`, with
/// every character that is not ASCII alphanumeric removed. Kinds without a
/// prefix, or whose prefix sanitizes to nothing, map to
/// [`BUILTIN_NAMESPACE`].
///
/// ```
/// use populace_config::namespace::infer_namespace;
///
/// assert_eq!(infer_namespace("mod1.Zombie"), "mod1");
/// assert_eq!(infer_namespace("my-mod.Wolf"), "mymod");
/// assert_eq!(infer_namespace("Skeleton"), "Vanilla");
/// ```
pub fn infer_namespace(entity_kind: &str) -> String {
    let Some((prefix, _)) = entity_kind.split_once('.') else {
        return BUILTIN_NAMESPACE.to_owned();
    };
    let sanitized: String = prefix.chars().filter(char::is_ascii_alphanumeric).collect();
    if sanitized.is_empty() {
        BUILTIN_NAMESPACE.to_owned()
    } else {
        sanitized
    }
}
