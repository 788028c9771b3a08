use crate::tags::tag_series_matches;
use crate::types::{ArchMatch, ServiceCandidateOption};

/// Sentinel tag meaning "nothing usable"; the update action is disabled.
pub const NO_TARGET: &str = "-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub tag: String,
    pub digest: Option<String>,
}

impl ResolvedTarget {
    pub fn none() -> Self {
        Self {
            tag: NO_TARGET.to_string(),
            digest: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.tag == NO_TARGET
    }
}

pub type ChangeFn = Box<dyn FnMut(&ResolvedTarget) + Send>;

/// Picks the target tag an update job should apply for one service.
///
/// Owns the ephemeral selection state of a single rendered instance. Every
/// change of the resolved `(tag, digest)` pair, including the implicit first
/// default, is reported through the change callback exactly once; reporting
/// the same value twice is suppressed. The resolver never reports a tag the
/// current option set marks non-selectable.
pub struct TargetResolver {
    current_tag: String,
    initial_hint: Option<String>,
    options: Vec<ServiceCandidateOption>,
    selected: Option<String>,
    resolved: ResolvedTarget,
    on_change: ChangeFn,
}

impl TargetResolver {
    pub fn new(
        current_tag: impl Into<String>,
        initial_hint: Option<String>,
        options: Vec<ServiceCandidateOption>,
        mut on_change: ChangeFn,
    ) -> Self {
        let current_tag = current_tag.into();
        let resolved = default_target(&current_tag, initial_hint.as_deref(), &options);
        on_change(&resolved);
        Self {
            current_tag,
            initial_hint,
            options,
            selected: None,
            resolved,
            on_change,
        }
    }

    pub fn target(&self) -> &ResolvedTarget {
        &self.resolved
    }

    /// Explicit user override. Returns false (and changes nothing) when the
    /// tag is absent from the option set or non-selectable.
    pub fn select(&mut self, tag: &str) -> bool {
        let Some(opt) = self.options.iter().find(|o| o.tag == tag) else {
            return false;
        };
        if !is_selectable(opt) {
            return false;
        }
        self.selected = Some(tag.to_string());
        let next = ResolvedTarget {
            tag: tag.to_string(),
            digest: opt.digest.clone(),
        };
        self.apply(next);
        true
    }

    /// Replace the option set. A prior override persists iff the new set
    /// still carries that tag as selectable; otherwise the resolver falls
    /// back to the computed default.
    pub fn set_options(&mut self, options: Vec<ServiceCandidateOption>) {
        self.options = options;

        let keep = self.selected.as_ref().is_some_and(|tag| {
            self.options
                .iter()
                .any(|o| o.tag == *tag && is_selectable(o))
        });
        if !keep {
            self.selected = None;
        }

        let next = match &self.selected {
            Some(tag) => ResolvedTarget {
                tag: tag.clone(),
                digest: digest_for(&self.options, tag),
            },
            None => default_target(&self.current_tag, self.initial_hint.as_deref(), &self.options),
        };
        self.apply(next);
    }

    fn apply(&mut self, next: ResolvedTarget) {
        if next == self.resolved {
            return;
        }
        self.resolved = next;
        (self.on_change)(&self.resolved);
    }
}

fn is_selectable(opt: &ServiceCandidateOption) -> bool {
    opt.digest.is_some() && !opt.ignored && opt.arch_match != ArchMatch::Mismatch
}

fn digest_for(options: &[ServiceCandidateOption], tag: &str) -> Option<String> {
    options
        .iter()
        .find(|o| o.tag == tag)
        .and_then(|o| o.digest.clone())
}

fn default_target(
    current_tag: &str,
    initial_hint: Option<&str>,
    options: &[ServiceCandidateOption],
) -> ResolvedTarget {
    let same_series = options
        .iter()
        .find(|o| is_selectable(o) && tag_series_matches(current_tag, &o.tag) == Some(true));
    if let Some(opt) = same_series.or_else(|| options.iter().find(|o| is_selectable(o))) {
        return ResolvedTarget {
            tag: opt.tag.clone(),
            digest: opt.digest.clone(),
        };
    }

    // The hint only applies while the option set does not contradict it;
    // a hint the set marks non-selectable must not be reported.
    if let Some(hint) = initial_hint.map(str::trim).filter(|h| !h.is_empty()) {
        let contradicted = options.iter().any(|o| o.tag == hint && !is_selectable(o));
        if !contradicted {
            return ResolvedTarget {
                tag: hint.to_string(),
                digest: digest_for(options, hint),
            };
        }
    }

    ResolvedTarget::none()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn option(tag: &str, digest: Option<&str>) -> ServiceCandidateOption {
        ServiceCandidateOption {
            tag: tag.to_string(),
            digest: digest.map(|s| s.to_string()),
            arch_match: ArchMatch::Match,
            arch: vec!["linux/amd64".to_string()],
            ignored: false,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<ResolvedTarget>>>, ChangeFn) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let f: ChangeFn = Box::new(move |t: &ResolvedTarget| {
            sink.lock().unwrap().push(t.clone());
        });
        (log, f)
    }

    #[test]
    fn prefers_same_series_selectable_option() {
        let (log, on_change) = recorder();
        let options = vec![
            option("6.0.0", Some("d0")),
            option("5.2.4", Some("d1")),
            option("5.3.0", Some("d2")),
        ];
        let resolver = TargetResolver::new("5.2.1", None, options, on_change);

        assert_eq!(resolver.target().tag, "5.2.4");
        assert_eq!(resolver.target().digest.as_deref(), Some("d1"));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn ignored_option_is_never_auto_chosen() {
        let (_, on_change) = recorder();
        let mut ignored = option("5.3.0", Some("d2"));
        ignored.ignored = true;
        let options = vec![option("5.2.4", Some("d1")), ignored];
        let resolver = TargetResolver::new("5.2.1", None, options, on_change);

        assert_eq!(resolver.target().tag, "5.2.4");
    }

    #[test]
    fn falls_back_to_first_selectable_of_any_series() {
        let (_, on_change) = recorder();
        let options = vec![option("7.0", None), option("6.1", Some("d6"))];
        let resolver = TargetResolver::new("5.2", None, options, on_change);

        assert_eq!(resolver.target().tag, "6.1");
    }

    #[test]
    fn empty_options_fall_back_to_hint_then_sentinel() {
        let (_, on_change) = recorder();
        let resolver =
            TargetResolver::new("5.2", Some("5.4.0".to_string()), Vec::new(), on_change);
        assert_eq!(resolver.target().tag, "5.4.0");
        assert_eq!(resolver.target().digest, None);

        let (_, on_change) = recorder();
        let resolver = TargetResolver::new("5.2", None, Vec::new(), on_change);
        assert!(resolver.target().is_none());
    }

    #[test]
    fn hint_contradicted_by_option_set_is_dropped() {
        let (_, on_change) = recorder();
        let mut blocked = option("5.4.0", Some("d4"));
        blocked.arch_match = ArchMatch::Mismatch;
        let resolver = TargetResolver::new(
            "5.2",
            Some("5.4.0".to_string()),
            vec![blocked],
            on_change,
        );
        assert!(resolver.target().is_none());
    }

    #[test]
    fn select_rejects_non_selectable_tags() {
        let (log, on_change) = recorder();
        let mut ignored = option("5.3.0", Some("d2"));
        ignored.ignored = true;
        let options = vec![option("5.2.4", Some("d1")), ignored, option("6.0", None)];
        let mut resolver = TargetResolver::new("5.2.1", None, options, on_change);

        assert!(!resolver.select("5.3.0"));
        assert!(!resolver.select("6.0"));
        assert!(!resolver.select("9.9.9"));
        assert_eq!(resolver.target().tag, "5.2.4");
        // Only the initial default was reported.
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn override_persists_while_tag_survives_option_change() {
        let (log, on_change) = recorder();
        let options = vec![option("5.2.4", Some("d1")), option("5.2.5", Some("d2"))];
        let mut resolver = TargetResolver::new("5.2.1", None, options, on_change);

        assert!(resolver.select("5.2.5"));
        assert_eq!(resolver.target().tag, "5.2.5");

        resolver.set_options(vec![option("5.2.4", Some("d1")), option("5.2.5", Some("d3"))]);
        assert_eq!(resolver.target().tag, "5.2.5");
        // Digest is re-paired from the new set.
        assert_eq!(resolver.target().digest.as_deref(), Some("d3"));

        // default, select, re-paired digest
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn override_resets_when_tag_disappears() {
        let (_, on_change) = recorder();
        let options = vec![option("5.2.4", Some("d1")), option("5.2.5", Some("d2"))];
        let mut resolver = TargetResolver::new("5.2.1", None, options, on_change);

        assert!(resolver.select("5.2.5"));
        resolver.set_options(vec![option("5.2.6", Some("d9"))]);
        assert_eq!(resolver.target().tag, "5.2.6");
    }

    #[test]
    fn identical_resolution_is_not_re_reported() {
        let (log, on_change) = recorder();
        let options = vec![option("5.2.4", Some("d1"))];
        let mut resolver = TargetResolver::new("5.2.1", None, options.clone(), on_change);

        resolver.set_options(options);
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
