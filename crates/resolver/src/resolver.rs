//! Ordered fallback chain mapping a recorded build path to a local file

use std::path::{Component, Path, PathBuf};

use tischiron_core::{CoreError, Resolution, ResolutionRequest, ResolutionStrategy};
use tracing::debug;

use crate::probe::{FileProbe, LocalFs};

const DEFAULT_ANCHOR: &str = "work";
const DEFAULT_MAX_SEARCH_DEPTH: usize = 6;
const SIBLING_DIRS: &[&str] = &["", "src"];

type Attempt<P> = fn(&PathResolver<P>, &ResolutionRequest) -> Option<PathBuf>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Local checkout searched by the sibling and recursive strategies
    pub project_root: PathBuf,
    /// Substituted for the anchor segment when the request carries no override
    pub local_root_override: Option<PathBuf>,
    /// Path segments shared by the remote and local layouts, e.g. `work` in
    /// `/home/ci/work/json-c/json_object.c`
    pub remote_anchors: Vec<String>,
    pub max_search_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            local_root_override: None,
            remote_anchors: vec![DEFAULT_ANCHOR.to_string()],
            max_search_depth: DEFAULT_MAX_SEARCH_DEPTH,
        }
    }
}

impl ResolverConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    pub fn with_local_root_override(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root_override = Some(root.into());
        self
    }

    pub fn with_remote_anchors(mut self, anchors: Vec<String>) -> Self {
        self.remote_anchors = anchors;
        self
    }

    pub fn with_max_search_depth(mut self, depth: usize) -> Self {
        self.max_search_depth = depth;
        self
    }
}

/// Stateless resolver; every call probes the filesystem afresh.
pub struct PathResolver<P: FileProbe = LocalFs> {
    config: ResolverConfig,
    probe: P,
}

impl PathResolver<LocalFs> {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_probe(config, LocalFs)
    }
}

impl<P: FileProbe> PathResolver<P> {
    pub fn with_probe(config: ResolverConfig, probe: P) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Build a request carrying the configured override root, if any.
    pub fn request(
        &self,
        remote_path: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<ResolutionRequest, CoreError> {
        let request = ResolutionRequest::new(remote_path, filename)?;
        Ok(match &self.config.local_root_override {
            Some(root) => request.with_local_root_override(root),
            None => request,
        })
    }

    /// Try each strategy in order; the first hit wins and later strategies
    /// never touch the filesystem.
    pub fn resolve(&self, request: &ResolutionRequest) -> Resolution {
        let strategies: [(ResolutionStrategy, Attempt<P>); 4] = [
            (ResolutionStrategy::Direct, Self::direct),
            (ResolutionStrategy::RootRemap, Self::root_remap),
            (ResolutionStrategy::Sibling, Self::sibling),
            (ResolutionStrategy::RecursiveSearch, Self::recursive_search),
        ];

        for (strategy, attempt) in strategies {
            if let Some(path) = attempt(self, request) {
                debug!(
                    remote_path = %request.remote_path(),
                    path = %path.display(),
                    strategy = strategy.as_str(),
                    "Resolved source file"
                );
                return Resolution::found(path, strategy);
            }
        }

        debug!(
            remote_path = %request.remote_path(),
            filename = %request.filename(),
            "Source file unresolved"
        );
        Resolution::Unresolved
    }

    fn direct(&self, request: &ResolutionRequest) -> Option<PathBuf> {
        let path = Path::new(request.remote_path());
        if path.as_os_str().is_empty() {
            return None;
        }
        self.probe.is_file(path).then(|| path.to_path_buf())
    }

    fn root_remap(&self, request: &ResolutionRequest) -> Option<PathBuf> {
        let root = request
            .local_root_override()
            .or(self.config.local_root_override.as_deref())?;
        let candidate = remap_path(request.remote_path(), &self.config.remote_anchors, root)?;
        self.probe.is_file(&candidate).then_some(candidate)
    }

    fn sibling(&self, request: &ResolutionRequest) -> Option<PathBuf> {
        SIBLING_DIRS
            .iter()
            .map(|dir| self.config.project_root.join(dir).join(request.filename()))
            .find(|candidate| self.probe.is_file(candidate))
    }

    fn recursive_search(&self, request: &ResolutionRequest) -> Option<PathBuf> {
        self.probe.find_by_name(
            &self.config.project_root,
            request.filename(),
            self.config.max_search_depth,
        )
    }
}

/// Replace everything up to and including the first anchor segment of
/// `remote_path` with `root`.
///
/// Returns `None` when no anchor occurs or nothing follows it.
pub fn remap_path(remote_path: &str, anchors: &[String], root: &Path) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = Path::new(remote_path).components().collect();

    let anchor_index = components.iter().position(|component| match component {
        Component::Normal(segment) => anchors
            .iter()
            .any(|anchor| segment.to_str() == Some(anchor.as_str())),
        _ => false,
    })?;

    let rest = &components[anchor_index + 1..];
    if rest.is_empty() {
        return None;
    }

    let mut mapped = root.to_path_buf();
    for component in rest {
        mapped.push(component.as_os_str());
    }
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Wraps the real filesystem and counts every probe.
    #[derive(Default)]
    struct CountingProbe {
        is_file_calls: AtomicUsize,
        find_calls: AtomicUsize,
    }

    impl CountingProbe {
        fn is_file_calls(&self) -> usize {
            self.is_file_calls.load(Ordering::SeqCst)
        }

        fn find_calls(&self) -> usize {
            self.find_calls.load(Ordering::SeqCst)
        }
    }

    impl FileProbe for CountingProbe {
        fn is_file(&self, path: &Path) -> bool {
            self.is_file_calls.fetch_add(1, Ordering::SeqCst);
            LocalFs.is_file(path)
        }

        fn find_by_name(&self, root: &Path, filename: &str, max_depth: usize) -> Option<PathBuf> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            LocalFs.find_by_name(root, filename, max_depth)
        }
    }

    fn write(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "int f(void) { return 0; }\n").unwrap();
    }

    fn counting_resolver(config: ResolverConfig) -> PathResolver<CountingProbe> {
        PathResolver::with_probe(config, CountingProbe::default())
    }

    #[test]
    fn test_direct_probe_wins_first() {
        let project = TempDir::new().unwrap();
        let file = project.path().join("json_object.c");
        write(&file);

        let resolver = counting_resolver(ResolverConfig::new(project.path()));
        let request = resolver
            .request(file.display().to_string(), "json_object.c")
            .unwrap();

        let resolution = resolver.resolve(&request);
        assert_eq!(resolution, Resolution::found(&file, ResolutionStrategy::Direct));
        assert_eq!(resolver.probe.is_file_calls(), 1);
        assert_eq!(resolver.probe.find_calls(), 0);
    }

    #[test]
    fn test_root_remap_skips_later_strategies() {
        let project = TempDir::new().unwrap();
        let local_root = TempDir::new().unwrap();
        let mapped = local_root.path().join("json-c/json_object.c");
        write(&mapped);

        let resolver = counting_resolver(
            ResolverConfig::new(project.path()).with_local_root_override(local_root.path()),
        );
        let request = resolver
            .request("/home/ci/work/json-c/json_object.c", "json_object.c")
            .unwrap();

        let resolution = resolver.resolve(&request);
        assert_eq!(
            resolution,
            Resolution::found(&mapped, ResolutionStrategy::RootRemap)
        );
        // direct probe + remapped probe, no sibling or recursive probes
        assert_eq!(resolver.probe.is_file_calls(), 2);
        assert_eq!(resolver.probe.find_calls(), 0);
    }

    #[test]
    fn test_request_override_beats_config_override() {
        let project = TempDir::new().unwrap();
        let configured = TempDir::new().unwrap();
        let requested = TempDir::new().unwrap();
        let mapped = requested.path().join("lib/x.c");
        write(&mapped);

        let resolver = PathResolver::new(
            ResolverConfig::new(project.path()).with_local_root_override(configured.path()),
        );
        let request = ResolutionRequest::new("/srv/work/lib/x.c", "x.c")
            .unwrap()
            .with_local_root_override(requested.path());

        assert_eq!(resolver.resolve(&request).path(), Some(mapped.as_path()));
    }

    #[test]
    fn test_sibling_search_checks_root_then_src() {
        let project = TempDir::new().unwrap();
        let in_src = project.path().join("src/arraylist.c");
        write(&in_src);

        let resolver = counting_resolver(ResolverConfig::new(project.path()));
        let request = resolver
            .request("/nonexistent/build/arraylist.c", "arraylist.c")
            .unwrap();

        let resolution = resolver.resolve(&request);
        assert_eq!(
            resolution,
            Resolution::found(&in_src, ResolutionStrategy::Sibling)
        );
        // direct, <root>/arraylist.c, <root>/src/arraylist.c
        assert_eq!(resolver.probe.is_file_calls(), 3);
        assert_eq!(resolver.probe.find_calls(), 0);
    }

    #[test]
    fn test_recursive_search_finds_nested_file() {
        let project = TempDir::new().unwrap();
        let nested = project.path().join("lib/json/printbuf.c");
        write(&nested);

        let resolver = counting_resolver(ResolverConfig::new(project.path()));
        let request = resolver
            .request("/nonexistent/printbuf.c", "printbuf.c")
            .unwrap();

        let resolution = resolver.resolve(&request);
        assert_eq!(
            resolution,
            Resolution::found(&nested, ResolutionStrategy::RecursiveSearch)
        );
        assert_eq!(resolver.probe.find_calls(), 1);
    }

    #[test]
    fn test_recursive_search_is_bounded() {
        let project = TempDir::new().unwrap();
        write(&project.path().join("a/b/c/d/deep.c"));

        let resolver =
            PathResolver::new(ResolverConfig::new(project.path()).with_max_search_depth(2));
        let request = resolver.request("/nonexistent/deep.c", "deep.c").unwrap();

        assert_eq!(resolver.resolve(&request), Resolution::Unresolved);
    }

    #[test]
    fn test_nonexistent_without_override_is_unresolved() {
        let project = TempDir::new().unwrap();
        write(&project.path().join("other.c"));

        let resolver = PathResolver::new(ResolverConfig::new(project.path()));
        let request = resolver.request("/nonexistent/x.c", "x.c").unwrap();

        assert_eq!(resolver.resolve(&request), Resolution::Unresolved);
    }

    #[test]
    fn test_override_without_anchor_falls_through() {
        let project = TempDir::new().unwrap();
        let local_root = TempDir::new().unwrap();
        write(&local_root.path().join("x.c"));

        let resolver = counting_resolver(
            ResolverConfig::new(project.path()).with_local_root_override(local_root.path()),
        );
        let request = resolver.request("/opt/build/x.c", "x.c").unwrap();

        assert_eq!(resolver.resolve(&request), Resolution::Unresolved);
        // remap produced no candidate, so only direct + two siblings were probed
        assert_eq!(resolver.probe.is_file_calls(), 3);
        assert_eq!(resolver.probe.find_calls(), 1);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let project = TempDir::new().unwrap();
        write(&project.path().join("deps/tokener.c"));

        let resolver = PathResolver::new(ResolverConfig::new(project.path()));
        let request = resolver.request("/remote/tokener.c", "tokener.c").unwrap();

        let first = resolver.resolve(&request);
        let second = resolver.resolve(&request);
        assert!(first.is_found());
        assert_eq!(first, second);

        let missing = resolver.request("/remote/none.c", "none.c").unwrap();
        assert_eq!(resolver.resolve(&missing), resolver.resolve(&missing));
    }

    #[test]
    fn test_remap_path() {
        let anchors = vec!["work".to_string()];
        let root = Path::new("/Users/me/src");

        assert_eq!(
            remap_path("/home/user/work/json-c/json_object.c", &anchors, root),
            Some(PathBuf::from("/Users/me/src/json-c/json_object.c"))
        );
        assert_eq!(remap_path("/home/user/json-c/x.c", &anchors, root), None);
        assert_eq!(remap_path("/home/user/work", &anchors, root), None);
        // segment must match whole, not as a substring
        assert_eq!(remap_path("/home/user/network/x.c", &anchors, root), None);
    }

    #[test]
    fn test_remap_path_uses_first_anchor_occurrence() {
        let anchors = vec!["work".to_string(), "ci".to_string()];
        let root = Path::new("/local");

        assert_eq!(
            remap_path("/ci/work/pkg/work/x.c", &anchors, root),
            Some(PathBuf::from("/local/work/pkg/work/x.c"))
        );
    }
}
