use em_core::naming::NAME_PLACEHOLDER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGenerator {
    template: String,
    counter: u64,
}

impl NameGenerator {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            counter: 0,
        }
    }

    pub fn next_name(&mut self) -> String {
        let name = self
            .template
            .replace(NAME_PLACEHOLDER, &format!("{:08x}", self.counter));
        self.counter += 1;
        name
    }
}

impl Iterator for NameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_name())
    }
}

#[cfg(test)]
mod names_tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_zero_padded_hex_substituted_into_template() {
        let mut names = NameGenerator::new("demo:generated/{name}");
        assert_eq!(names.next_name(), "demo:generated/00000000");
        assert_eq!(names.next_name(), "demo:generated/00000001");
        let rest = names.by_ref().take(15).collect::<Vec<_>>();
        assert_eq!(rest.last().map(String::as_str), Some("demo:generated/00000010"));
    }

    #[test]
    fn independent_generators_produce_identical_sequences() {
        let first = NameGenerator::new("ns.generated.{name}")
            .take(10_000)
            .collect::<Vec<_>>();
        let second = NameGenerator::new("ns.generated.{name}")
            .take(10_000)
            .collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn names_never_repeat_within_one_stream() {
        let names = NameGenerator::new("{name}").take(10_000).collect::<Vec<_>>();
        let unique = names.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), names.len());
        assert!(names.iter().all(|name| name.len() == 8));
    }
}
