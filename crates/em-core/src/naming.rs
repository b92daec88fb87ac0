use std::sync::OnceLock;

use regex::Regex;

use crate::types::{LifecycleHook, Visibility};

pub const DEFAULT_NAMESPACE: &str = "minecraft";
pub const NAME_PLACEHOLDER: &str = "{name}";
pub const PRIVATE_SEGMENT: &str = "_private";

/// Snake-case a declared name, e.g. `HelloWorld2` -> `hello_world_2`.
pub fn underscore(name: &str) -> String {
    let joined = name_parts_regex()
        .find_iter(name)
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join("_");
    let mut result = joined.to_lowercase();
    if result.starts_with(|ch: char| ch.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

pub fn is_valid_name(name: &str) -> bool {
    identifier_regex().is_match(name)
}

pub fn is_valid_namespace(namespace: &str) -> bool {
    namespace_regex().is_match(namespace)
}

pub fn split_location(location: &str) -> (&str, &str) {
    location
        .split_once(':')
        .unwrap_or((DEFAULT_NAMESPACE, location))
}

pub fn qualify(namespace: &str, location: &str) -> String {
    if location.contains(':') {
        location.to_string()
    } else {
        format!("{}:{}", namespace, location)
    }
}

pub fn component_function(
    namespace: &str,
    component: &str,
    origin: Option<&str>,
    visibility: Visibility,
    method: &str,
) -> String {
    let mut path = format!("{}:component/{}/", namespace, component);
    if let Some(origin) = origin {
        path.push_str(origin);
        path.push('/');
    }
    if visibility == Visibility::Private {
        path.push_str(PRIVATE_SEGMENT);
        path.push('/');
    }
    path.push_str(method);
    path
}

pub fn attach_function(namespace: &str, component: &str) -> String {
    format!("{}:attach/{}", namespace, component)
}

pub fn detach_function(namespace: &str, component: &str) -> String {
    format!("{}:detach/{}", namespace, component)
}

pub fn callback_tag(namespace: &str, hook: LifecycleHook, component: &str) -> String {
    format!("{}:component/callback/{}/{}", namespace, hook, component)
}

pub fn marker_tag(namespace: &str, component: &str) -> String {
    format!("{}.component.{}", namespace, component)
}

pub fn generated_function_template(namespace: &str) -> String {
    format!("{}:generated/{}", namespace, NAME_PLACEHOLDER)
}

pub fn generated_tag_template(namespace: &str) -> String {
    format!("{}.generated.{}", namespace, NAME_PLACEHOLDER)
}

pub fn function_file_path(location: &str) -> String {
    let (namespace, path) = split_location(location);
    format!("data/{}/functions/{}.mcfunction", namespace, path)
}

pub fn tag_file_path(location: &str) -> String {
    let (namespace, path) = split_location(location);
    format!("data/{}/tags/functions/{}.json", namespace, path)
}

fn name_parts_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[a-z]+|[A-Z][a-z]+|[A-Z]+|[0-9]+").expect("name parts regex"))
}

fn identifier_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[a-z0-9_][a-z0-9_.-]*$").expect("identifier regex"))
}

fn namespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[a-z0-9_.-]+$").expect("namespace regex"))
}

#[cfg(test)]
mod naming_tests {
    use super::*;

    #[test]
    fn underscore_splits_words_and_numbers() {
        assert_eq!(underscore("Hello"), "hello");
        assert_eq!(underscore("HelloWorld"), "hello_world");
        assert_eq!(underscore("say_hello"), "say_hello");
        assert_eq!(underscore("Player2Spawn"), "player_2_spawn");
        assert_eq!(underscore("3d"), "_3_d");
        assert_eq!(underscore(""), "");
    }

    #[test]
    fn identifiers_and_namespaces_follow_resource_path_rules() {
        assert!(is_valid_name("say_hello"));
        assert!(is_valid_name("_private_thing"));
        assert!(!is_valid_name("Say"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name(""));
        assert!(is_valid_namespace("demo"));
        assert!(!is_valid_namespace("demo:x"));
    }

    #[test]
    fn component_function_places_private_segment_before_method() {
        assert_eq!(
            component_function("ns", "hello", None, Visibility::Public, "say_hello"),
            "ns:component/hello/say_hello"
        );
        assert_eq!(
            component_function("ns", "hello", None, Visibility::Private, "secret"),
            "ns:component/hello/_private/secret"
        );
        assert_eq!(
            component_function("ns", "dog", Some("animal"), Visibility::Private, "eat"),
            "ns:component/dog/animal/_private/eat"
        );
    }

    #[test]
    fn fixed_locations_match_the_pack_conventions() {
        assert_eq!(attach_function("ns", "hello"), "ns:attach/hello");
        assert_eq!(detach_function("ns", "hello"), "ns:detach/hello");
        assert_eq!(
            callback_tag("ns", LifecycleHook::Tick, "hello"),
            "ns:component/callback/tick/hello"
        );
        assert_eq!(marker_tag("ns", "hello"), "ns.component.hello");
        assert_eq!(generated_function_template("ns"), "ns:generated/{name}");
        assert_eq!(generated_tag_template("ns"), "ns.generated.{name}");
    }

    #[test]
    fn locations_map_to_pack_relative_paths() {
        assert_eq!(qualify("ns", "tagged"), "ns:tagged");
        assert_eq!(qualify("ns", "minecraft:tick"), "minecraft:tick");
        assert_eq!(split_location("tick"), ("minecraft", "tick"));
        assert_eq!(
            function_file_path("ns:attach/hello"),
            "data/ns/functions/attach/hello.mcfunction"
        );
        assert_eq!(
            tag_file_path("minecraft:tick"),
            "data/minecraft/tags/functions/tick.json"
        );
    }
}
