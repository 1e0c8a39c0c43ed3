//! Replacement resolution
//!
//! A fragment declaring `replaces: [a, b]` supersedes every other fragment
//! whose `name` is `a` or `b`. Replacement is a union over all fragments that
//! passed selection: a name is dropped if anyone replaces it.

use crate::core::fragment::Fragment;
use crate::core::warning::Warning;
use log::debug;
use std::collections::BTreeSet;

struct Declared {
    name: Option<String>,
    replaces: BTreeSet<String>,
}

impl Declared {
    fn of(fragment: &Fragment) -> Self {
        let fm = fragment.front_matter();
        let name = fm.name().map(str::to_string);
        let replaces = fm
            .replaces()
            .into_iter()
            .filter(|replaced| Some(replaced.as_str()) != name.as_deref())
            .collect();
        Self { name, replaces }
    }
}

/// Drop every fragment whose name another fragment replaces
///
/// Self references are ignored. When two fragments replace each other the
/// one later in `fragments` is kept and a [`Warning::ReplacementConflict`]
/// is reported.
pub fn resolve_replacements(fragments: Vec<Fragment>) -> (Vec<Fragment>, Vec<Warning>) {
    let declared: Vec<Declared> = fragments.iter().map(Declared::of).collect();
    let mut dropped = vec![false; fragments.len()];
    let mut warnings = Vec::new();

    for (i, current) in declared.iter().enumerate() {
        let Some(name) = &current.name else { continue };

        for (j, other) in declared.iter().enumerate() {
            if i == j || !other.replaces.contains(name) {
                continue;
            }
            let mutual = other
                .name
                .as_ref()
                .is_some_and(|other_name| current.replaces.contains(other_name));
            if mutual && j < i {
                continue;
            }

            dropped[i] = true;
            if mutual {
                warnings.push(Warning::ReplacementConflict {
                    kept: fragments[j].path().to_path_buf(),
                    dropped: fragments[i].path().to_path_buf(),
                });
            }
            debug!(
                "{} replaced by {}",
                fragments[i].path().display(),
                fragments[j].path().display()
            );
            break;
        }
    }

    let kept = fragments
        .into_iter()
        .zip(dropped)
        .filter_map(|(fragment, dropped)| (!dropped).then_some(fragment))
        .collect();
    (kept, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fragment::FragmentKind;
    use crate::core::front_matter::FrontMatter;
    use crate::core::value::FrontMatterValue;
    use pretty_assertions::assert_eq;

    fn rule(file: &str, fm: FrontMatter) -> Fragment {
        Fragment::new(format!("/repo/{}", file), FragmentKind::Rule, fm, file)
    }

    fn bodies(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(Fragment::body).collect()
    }

    #[test]
    fn test_replaced_fragment_is_dropped() {
        let fragments = vec![
            rule("old.md", FrontMatter::new().with("name", "old-style")),
            rule("new.md", FrontMatter::new().with("replaces", "old-style")),
            rule("plain.md", FrontMatter::new()),
        ];
        let (kept, warnings) = resolve_replacements(fragments);
        assert_eq!(bodies(&kept), vec!["new.md", "plain.md"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_union_of_replaces() {
        let fragments = vec![
            rule("a.md", FrontMatter::new().with("name", "a")),
            rule("b.md", FrontMatter::new().with("name", "b")),
            rule("c.md", FrontMatter::new().with("name", "c")),
            rule("x.md", FrontMatter::new().with("replaces", "a, b")),
            rule(
                "y.md",
                FrontMatter::new().with("replaces", FrontMatterValue::list(["c"])),
            ),
        ];
        let (kept, _) = resolve_replacements(fragments);
        assert_eq!(bodies(&kept), vec!["x.md", "y.md"]);
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let fragments = vec![rule(
            "self.md",
            FrontMatter::new().with("name", "me").with("replaces", "me"),
        )];
        let (kept, warnings) = resolve_replacements(fragments);
        assert_eq!(kept.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_mutual_replacement_keeps_later() {
        let fragments = vec![
            rule("first.md", FrontMatter::new().with("name", "a").with("replaces", "b")),
            rule("second.md", FrontMatter::new().with("name", "b").with("replaces", "a")),
        ];
        let (kept, warnings) = resolve_replacements(fragments);
        assert_eq!(bodies(&kept), vec!["second.md"]);
        assert_eq!(
            warnings,
            vec![Warning::ReplacementConflict {
                kept: "/repo/second.md".into(),
                dropped: "/repo/first.md".into(),
            }]
        );
    }

    #[test]
    fn test_replacer_can_itself_be_replaced() {
        let fragments = vec![
            rule("base.md", FrontMatter::new().with("name", "base")),
            rule("mid.md", FrontMatter::new().with("name", "mid").with("replaces", "base")),
            rule("top.md", FrontMatter::new().with("replaces", "mid")),
        ];
        let (kept, _) = resolve_replacements(fragments);
        assert_eq!(bodies(&kept), vec!["top.md"]);
    }
}
