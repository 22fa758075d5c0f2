//! Layered resolution of policies and spawn entries from override records.
//!
//! Overrides are stored as single delimited records (`MONSTER|true|false|false`
//! for a policy, `weight|packSize|minGroup|maxGroup` for a spawn entry) in one
//! or more [`OverrideLayer`]s. [`PolicyResolver`] folds a default value through
//! the layers in order, so a later layer wins over an earlier one.
//!
//! Resolution never fails. Damaged records are repaired in place:
//!
//! - A record that does not split into exactly [`RECORD_FIELDS`] fields is
//!   ignored; the incoming value is kept and its canonical encoding is
//!   written back.
//! - A field that does not parse takes the incoming value for that field; the
//!   record is rewritten with the canonical encoding of the repaired result.
//!
//! Every repair is logged at `warn` level and counted in
//! [`PolicyResolver::repaired_records`].

use tracing::warn;

use populace_config::document::ConfigDocument;

use crate::category::{CategoryId, CreatureTypeRegistry};
use crate::policy::LivingPolicy;
use crate::spawn::SpawnEntry;

/// Default field delimiter for override records.
pub const DEFAULT_DELIMITER: char = '|';

/// Number of fields in every policy and spawn-entry record.
pub const RECORD_FIELDS: usize = 4;

/// Section holding policy records, keyed by entity kind.
pub const LIVING_HANDLER_SECTION: &str = "creaturesettings.livinghandler";

/// Prefix of the per-biome sections holding spawn-entry records.
pub const SPAWN_LIST_SECTION: &str = "creaturesettings.spawnlistentry";

/// Section holding the spawn-entry records for `biome`.
pub fn spawn_list_section(biome: &str) -> String {
    format!("{SPAWN_LIST_SECTION}.{biome}")
}

/// Comment describing the policy record format.
pub fn living_handler_comment(delimiter: char) -> String {
    format!(
        "Editable Format: CreatureType{d}ShouldSpawn{d}ForceDespawn{d}UseCustomLocationCheck",
        d = delimiter
    )
}

/// Comment describing the spawn-entry record format.
pub fn spawn_list_comment(delimiter: char) -> String {
    format!(
        "Editable Format: SpawnWeight{d}SpawnPackSize{d}MinChunkPackSize{d}MaxChunkPackSize",
        d = delimiter
    )
}

// ---------------------------------------------------------------------------
// OverrideLayer
// ---------------------------------------------------------------------------

/// A source of raw override records.
pub trait OverrideLayer {
    /// The record under `section`/`key`. When absent, `default` is stored and
    /// returned so that the layer always ends up holding an editable record.
    fn record_or_insert(&mut self, section: &str, key: &str, default: &str) -> String;

    /// Replace the record under `section`/`key`.
    fn rewrite(&mut self, section: &str, key: &str, value: String);
}

impl OverrideLayer for ConfigDocument {
    fn record_or_insert(&mut self, section: &str, key: &str, default: &str) -> String {
        self.get_or_insert(section, key, default)
    }

    fn rewrite(&mut self, section: &str, key: &str, value: String) {
        self.set(section, key, value);
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

fn split_record(raw: &str, delimiter: char) -> Option<[&str; RECORD_FIELDS]> {
    let mut parts = raw.split(delimiter);
    let fields = [parts.next()?, parts.next()?, parts.next()?, parts.next()?];
    match parts.next() {
        Some(_) => None,
        None => Some(fields),
    }
}

/// Parses the fields of one record, remembering whether any of them had to
/// fall back to the incoming value.
struct FieldParser<'a> {
    key: &'a str,
    clean: bool,
}

impl<'a> FieldParser<'a> {
    fn new(key: &'a str) -> Self {
        Self { key, clean: true }
    }

    fn flag(&mut self, raw: &str, fallback: bool, field: &'static str) -> bool {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            true
        } else if raw.eq_ignore_ascii_case("false") {
            false
        } else {
            warn!(
                key = %self.key,
                field,
                value = raw,
                fallback,
                "unreadable boolean in override record -- using default"
            );
            self.clean = false;
            fallback
        }
    }

    fn count(&mut self, raw: &str, fallback: u32, field: &'static str) -> u32 {
        match raw.trim().parse::<u32>() {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    key = %self.key,
                    field,
                    value = raw,
                    fallback,
                    error = %e,
                    "unreadable integer in override record -- using default"
                );
                self.clean = false;
                fallback
            }
        }
    }

    fn category(
        &mut self,
        raw: &str,
        fallback: &CategoryId,
        categories: &CreatureTypeRegistry,
    ) -> CategoryId {
        let id = CategoryId::new(raw);
        if id.is_none() || categories.contains(id.as_str()) {
            id
        } else {
            warn!(
                key = %self.key,
                value = raw,
                fallback = %fallback,
                registered = %categories.registered_ids(),
                "unknown creature category in override record -- using default"
            );
            self.clean = false;
            fallback.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// PolicyResolver
// ---------------------------------------------------------------------------

/// Folds defaults through override layers.
#[derive(Debug)]
pub struct PolicyResolver<'c> {
    categories: &'c CreatureTypeRegistry,
    delimiter: char,
    repaired: usize,
}

impl<'c> PolicyResolver<'c> {
    /// Create a resolver that validates category ids against `categories`
    /// and splits records on `delimiter`.
    pub fn new(categories: &'c CreatureTypeRegistry, delimiter: char) -> Self {
        Self {
            categories,
            delimiter,
            repaired: 0,
        }
    }

    /// The record delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Number of records rewritten because they were damaged.
    pub fn repaired_records(&self) -> usize {
        self.repaired
    }

    /// Resolve a policy through `layers`, first to last.
    pub fn resolve_policy(
        &mut self,
        default: LivingPolicy,
        layers: &mut [&mut dyn OverrideLayer],
    ) -> LivingPolicy {
        let mut policy = default;
        for layer in layers.iter_mut() {
            policy = self.apply_policy_layer(policy, &mut **layer);
        }
        policy
    }

    /// Resolve a spawn entry through `layers`, first to last.
    pub fn resolve_entry(
        &mut self,
        default: SpawnEntry,
        layers: &mut [&mut dyn OverrideLayer],
    ) -> SpawnEntry {
        let mut entry = default;
        for layer in layers.iter_mut() {
            entry = self.apply_entry_layer(entry, &mut **layer);
        }
        entry
    }

    /// Apply a single layer to `current`.
    pub fn apply_policy_layer(
        &mut self,
        current: LivingPolicy,
        layer: &mut dyn OverrideLayer,
    ) -> LivingPolicy {
        let key = current.entity_kind().to_owned();
        let canonical = current.encode(self.delimiter);
        let raw = layer.record_or_insert(LIVING_HANDLER_SECTION, &key, &canonical);

        let Some([category, should_spawn, force_despawn, location_check]) =
            split_record(&raw, self.delimiter)
        else {
            warn!(
                entity_kind = %key,
                record = %raw,
                replacement = %canonical,
                "policy record does not have {RECORD_FIELDS} fields -- replacing it with defaults"
            );
            layer.rewrite(LIVING_HANDLER_SECTION, &key, canonical);
            self.repaired += 1;
            return current;
        };

        let mut fields = FieldParser::new(&key);
        let category = fields.category(category, current.category(), self.categories);
        let should_spawn = fields.flag(should_spawn, current.should_spawn(), "should_spawn");
        let force_despawn = fields.flag(force_despawn, current.force_despawn(), "force_despawn");
        let location_check = fields.flag(
            location_check,
            current.use_custom_location_check(),
            "use_custom_location_check",
        );

        let resolved = LivingPolicy::new(
            &key,
            category.as_str(),
            should_spawn,
            force_despawn,
            location_check,
            self.categories,
        );
        if !fields.clean {
            layer.rewrite(LIVING_HANDLER_SECTION, &key, resolved.encode(self.delimiter));
            self.repaired += 1;
        }
        resolved
    }

    /// Apply a single layer to `current`.
    pub fn apply_entry_layer(
        &mut self,
        current: SpawnEntry,
        layer: &mut dyn OverrideLayer,
    ) -> SpawnEntry {
        let section = spawn_list_section(current.biome());
        let key = current.entity_kind().to_owned();
        let canonical = current.encode(self.delimiter);
        let raw = layer.record_or_insert(&section, &key, &canonical);

        let Some([weight, pack_size, min_group, max_group]) = split_record(&raw, self.delimiter)
        else {
            warn!(
                entity_kind = %key,
                biome = %current.biome(),
                record = %raw,
                replacement = %canonical,
                "spawn record does not have {RECORD_FIELDS} fields -- replacing it with defaults"
            );
            layer.rewrite(&section, &key, canonical);
            self.repaired += 1;
            return current;
        };

        let mut fields = FieldParser::new(&key);
        let weight = fields.count(weight, current.weight(), "weight");
        let pack_size = fields.count(pack_size, current.pack_size(), "pack_size");
        let mut min_group = fields.count(min_group, current.min_group(), "min_group");
        let mut max_group = fields.count(max_group, current.max_group(), "max_group");
        if min_group > max_group {
            warn!(
                entity_kind = %key,
                biome = %current.biome(),
                min_group,
                max_group,
                "spawn record has min group above max group -- using default group bounds"
            );
            fields.clean = false;
            min_group = current.min_group();
            max_group = current.max_group();
        }

        let resolved = SpawnEntry::new(
            &key,
            current.biome(),
            weight,
            pack_size,
            min_group,
            max_group,
        );
        if !fields.clean {
            layer.rewrite(&section, &key, resolved.encode(self.delimiter));
            self.repaired += 1;
        }
        resolved
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> CreatureTypeRegistry {
        CreatureTypeRegistry::with_defaults()
    }

    fn creature_default(categories: &CreatureTypeRegistry) -> LivingPolicy {
        LivingPolicy::new("mod1.Cow", "CREATURE", true, false, false, categories)
    }

    fn layer_with(record: &str) -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.set(LIVING_HANDLER_SECTION, "mod1.Cow", record);
        doc
    }

    #[test]
    fn split_requires_exactly_four_fields() {
        assert_eq!(split_record("a|b|c|d", '|'), Some(["a", "b", "c", "d"]));
        assert_eq!(split_record("a|b|c", '|'), None);
        assert_eq!(split_record("a|b|c|d|e", '|'), None);
        assert_eq!(split_record("", '|'), None);
    }

    #[test]
    fn absent_record_keeps_default_and_materializes_it() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut doc = ConfigDocument::new();
        let default = creature_default(&categories);

        let resolved = resolver.resolve_policy(default.clone(), &mut [&mut doc]);
        assert_eq!(resolved, default);
        assert_eq!(
            doc.get(LIVING_HANDLER_SECTION, "mod1.Cow"),
            Some("CREATURE|true|false|false")
        );
        assert_eq!(resolver.repaired_records(), 0);
    }

    #[test]
    fn well_formed_record_overrides_every_field() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut doc = layer_with("monster|FALSE|true|True");

        let resolved = resolver.resolve_policy(creature_default(&categories), &mut [&mut doc]);
        assert_eq!(resolved.category().as_str(), "MONSTER");
        assert!(!resolved.should_spawn());
        assert!(resolved.force_despawn());
        assert!(resolved.use_custom_location_check());
        // Well-formed records are left as the user wrote them.
        assert_eq!(doc.get(LIVING_HANDLER_SECTION, "mod1.Cow"), Some("monster|FALSE|true|True"));
        assert_eq!(resolver.repaired_records(), 0);
    }

    #[test]
    fn later_layer_wins() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut global = layer_with("MONSTER|false|false|false");
        let mut world = layer_with("AMBIENT|true|false|false");

        let resolved =
            resolver.resolve_policy(creature_default(&categories), &mut [&mut global, &mut world]);
        assert_eq!(resolved.category().as_str(), "AMBIENT");
        assert!(resolved.should_spawn());
    }

    #[test]
    fn wrong_field_count_replaces_record_with_default() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut doc = layer_with("MONSTER|false");
        let default = creature_default(&categories);

        let resolved = resolver.resolve_policy(default.clone(), &mut [&mut doc]);
        assert_eq!(resolved, default);
        assert_eq!(
            doc.get(LIVING_HANDLER_SECTION, "mod1.Cow"),
            Some("CREATURE|true|false|false")
        );
        assert_eq!(resolver.repaired_records(), 1);
    }

    #[test]
    fn unreadable_boolean_falls_back_per_field() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut doc = layer_with("MONSTER|notabool|false|true");

        let resolved = resolver.resolve_policy(creature_default(&categories), &mut [&mut doc]);
        assert_eq!(resolved.category().as_str(), "MONSTER");
        assert!(resolved.should_spawn(), "falls back to the incoming default");
        assert!(resolved.use_custom_location_check());
        assert_eq!(
            doc.get(LIVING_HANDLER_SECTION, "mod1.Cow"),
            Some("MONSTER|true|false|true")
        );
        assert_eq!(resolver.repaired_records(), 1);
    }

    #[test]
    fn unknown_category_falls_back_to_incoming_category() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut doc = layer_with("NETHER|true|false|false");

        let resolved = resolver.resolve_policy(creature_default(&categories), &mut [&mut doc]);
        assert_eq!(resolved.category().as_str(), "CREATURE");
        assert_eq!(
            doc.get(LIVING_HANDLER_SECTION, "mod1.Cow"),
            Some("CREATURE|true|false|false")
        );
    }

    #[test]
    fn none_category_is_accepted() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let mut doc = layer_with("none|true|false|false");

        let resolved = resolver.resolve_policy(creature_default(&categories), &mut [&mut doc]);
        assert!(resolved.category().is_none());
        assert!(!resolved.generates_spawns());
        assert_eq!(resolver.repaired_records(), 0);
    }

    #[test]
    fn custom_delimiter_is_honored() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, ',');
        let mut doc = layer_with("AMBIENT,false,false,false");

        let resolved = resolver.resolve_policy(creature_default(&categories), &mut [&mut doc]);
        assert_eq!(resolved.category().as_str(), "AMBIENT");
        assert!(!resolved.should_spawn());
    }

    #[test]
    fn spawn_entry_layers_override_and_repair() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let section = spawn_list_section("Plains");
        let mut global = ConfigDocument::new();
        global.set(&section, "mod1.Cow", "25|4|1|3");
        let mut world = ConfigDocument::new();
        world.set(&section, "mod1.Cow", "x|4|2|2");

        let baseline = SpawnEntry::new("mod1.Cow", "Plains", 8, 4, 2, 4);
        let resolved = resolver.resolve_entry(baseline, &mut [&mut global, &mut world]);

        // Weight falls back to the global layer's value, not the baseline.
        assert_eq!(resolved.weight(), 25);
        assert_eq!((resolved.min_group(), resolved.max_group()), (2, 2));
        assert_eq!(world.get(&section, "mod1.Cow"), Some("25|4|2|2"));
        assert_eq!(resolver.repaired_records(), 1);
    }

    #[test]
    fn inverted_group_bounds_are_repaired() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let section = spawn_list_section("Plains");
        let mut doc = ConfigDocument::new();
        doc.set(&section, "mod1.Cow", "10|4|6|2");

        let baseline = SpawnEntry::new("mod1.Cow", "Plains", 8, 4, 2, 4);
        let resolved = resolver.resolve_entry(baseline, &mut [&mut doc]);
        assert_eq!(resolved.weight(), 10);
        assert_eq!((resolved.min_group(), resolved.max_group()), (2, 4));
        assert_eq!(doc.get(&section, "mod1.Cow"), Some("10|4|2|4"));
    }

    #[test]
    fn negative_weight_is_unreadable() {
        let categories = categories();
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let section = spawn_list_section("Plains");
        let mut doc = ConfigDocument::new();
        doc.set(&section, "mod1.Cow", "-5|4|1|2");

        let resolved = resolver.resolve_entry(SpawnEntry::placeholder("mod1.Cow", "Plains"), &mut [&mut doc]);
        assert_eq!(resolved.weight(), 0);
        assert_eq!((resolved.min_group(), resolved.max_group()), (1, 2));
    }
}
