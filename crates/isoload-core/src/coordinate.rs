use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{IsoError, Result};

/// A remote artifact repository, identified solely by its base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Repository {
    url: String,
}

impl Repository {
    pub const MAVEN_CENTRAL_URL: &'static str = "https://repo1.maven.org/maven2";
    pub const SPONGE_URL: &'static str = "https://repo.spongepowered.org/maven";

    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// The repository that is always consulted, even if no coordinate names it.
    pub fn maven_central() -> Self {
        Self::new(Self::MAVEN_CENTRAL_URL)
    }

    pub fn sponge() -> Self {
        Self::new(Self::SPONGE_URL)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Absolute URL of `relative` inside this repository.
    pub fn resolve(&self, relative: &str) -> Result<url::Url> {
        let joined = format!("{}/{}", self.url, relative.trim_start_matches('/'));
        url::Url::parse(&joined)
            .map_err(|e| IsoError::Config(format!("invalid repository url {joined}: {e}")))
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::maven_central()
    }
}

impl From<String> for Repository {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<Repository> for String {
    fn from(repo: Repository) -> Self {
        repo.url
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A group/artifact filter over transitively discovered dependencies.
///
/// `None` is a wildcard. A pattern matches when every present filter equals
/// the corresponding field; a match suppresses the dependency and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ExclusionPattern {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
}

impl ExclusionPattern {
    pub fn new(group_id: Option<&str>, artifact_id: Option<&str>) -> Self {
        Self {
            group_id: group_id.map(str::to_string),
            artifact_id: artifact_id.map(str::to_string),
        }
    }

    /// Parse `group[:artifact]`. Missing or empty parts become wildcards and
    /// anything after a second `:` is ignored.
    pub fn parse(pattern: &str) -> Self {
        let mut parts = pattern.splitn(3, ':');
        let part = |p: Option<&str>| p.filter(|s| !s.is_empty()).map(str::to_string);
        let group_id = part(parts.next());
        let artifact_id = part(parts.next());
        Self {
            group_id,
            artifact_id,
        }
    }

    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        if self.group_id.as_deref().is_some_and(|g| g != group_id) {
            return false;
        }
        if self.artifact_id.as_deref().is_some_and(|a| a != artifact_id) {
            return false;
        }
        true
    }

    pub fn matches_coordinate(&self, coordinate: &DependencyCoordinate) -> bool {
        self.matches(&coordinate.group_id, &coordinate.artifact_id)
    }
}

impl From<String> for ExclusionPattern {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ExclusionPattern> for String {
    fn from(p: ExclusionPattern) -> Self {
        p.to_string()
    }
}

impl fmt::Display for ExclusionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.group_id.as_deref().unwrap_or(""),
            self.artifact_id.as_deref().unwrap_or("")
        )
    }
}

/// A downloadable artifact plus the checksums it must match.
///
/// Both hashes are required. Neither MD5 nor SHA-1 is trusted alone, but no
/// practical way is known to forge a file matching both, and repositories
/// publish exactly these two.
///
/// ```
/// use isoload_core::{DependencyCoordinate, Repository};
///
/// let hocon = DependencyCoordinate::builder(
///     "org.spongepowered",
///     "configurate-hocon",
///     "3.6.1",
///     "6395403afce7b9bbf4e26ef74c13da9a",
///     "e3f199dbd91de753a70f63606f530fdb8644bbd5",
/// )
/// .repository(Repository::sponge())
/// .transitive()
/// .exclusion("com.google.code.findbugs:jsr305")
/// .build();
///
/// assert_eq!(hocon.display_id(), "org.spongepowered:configurate-hocon:3.6.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CoordinateFields")]
pub struct DependencyCoordinate {
    group_id: String,
    artifact_id: String,
    version: String,
    classifier: Option<String>,
    md5: String,
    sha1: String,
    repository: Repository,
    transitive: bool,
    exclusions: Vec<ExclusionPattern>,
}

/// Deserialized form of a coordinate, checked by [`DependencyCoordinate::validate`]
/// before it is accepted.
#[derive(Deserialize)]
struct CoordinateFields {
    group_id: String,
    artifact_id: String,
    version: String,
    #[serde(default)]
    classifier: Option<String>,
    md5: String,
    sha1: String,
    #[serde(default)]
    repository: Repository,
    #[serde(default)]
    transitive: bool,
    #[serde(default)]
    exclusions: Vec<ExclusionPattern>,
}

impl TryFrom<CoordinateFields> for DependencyCoordinate {
    type Error = IsoError;

    fn try_from(f: CoordinateFields) -> Result<Self> {
        let coordinate = CoordinateBuilder {
            group_id: f.group_id,
            artifact_id: f.artifact_id,
            version: f.version,
            classifier: f.classifier,
            md5: f.md5,
            sha1: f.sha1,
            repository: f.repository,
            transitive: f.transitive,
            exclusions: f.exclusions,
        }
        .build();
        coordinate.validate()?;
        Ok(coordinate)
    }
}

/// The identity part of a coordinate: `(group, artifact, version, classifier)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactIdentity {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
}

impl DependencyCoordinate {
    pub fn builder(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        md5: impl Into<String>,
        sha1: impl Into<String>,
    ) -> CoordinateBuilder {
        CoordinateBuilder {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            md5: md5.into(),
            sha1: sha1.into(),
            repository: Repository::maven_central(),
            transitive: false,
            exclusions: Vec::new(),
        }
    }

    /// A builder pre-filled with every field of this coordinate, used to
    /// derive variants that differ in one or two fields.
    pub fn derive(&self) -> CoordinateBuilder {
        CoordinateBuilder {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            classifier: self.classifier.clone(),
            md5: self.md5.clone(),
            sha1: self.sha1.clone(),
            repository: self.repository.clone(),
            transitive: self.transitive,
            exclusions: self.exclusions.clone(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn md5(&self) -> &str {
        &self.md5
    }

    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    pub fn exclusions(&self) -> &[ExclusionPattern] {
        &self.exclusions
    }

    pub fn identity(&self) -> ArtifactIdentity {
        ArtifactIdentity {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            classifier: self.classifier.clone(),
        }
    }

    pub fn same_identity(&self, other: &DependencyCoordinate) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.version == other.version
            && self.classifier == other.classifier
    }

    /// `group:artifact:version[:classifier]`
    pub fn display_id(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.version, c
            ),
            None => format!("{}:{}:{}", self.group_id, self.artifact_id, self.version),
        }
    }

    /// `artifact-version[-classifier].jar`
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.jar", self.artifact_id, self.version, c),
            None => format!("{}-{}.jar", self.artifact_id, self.version),
        }
    }

    /// Check that every part of the coordinate is usable as a single path
    /// segment, so [`relative_path`](Self::relative_path) stays below the
    /// directory it is joined to.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| IsoError::InvalidCoordinate {
            coordinate: self.display_id(),
            reason,
        };
        if self.group_id.is_empty() {
            return Err(invalid("group id is empty".into()));
        }
        for segment in self.group_id.split('.') {
            check_segment("group id", segment).map_err(invalid)?;
        }
        check_segment("artifact id", &self.artifact_id).map_err(invalid)?;
        check_segment("version", &self.version).map_err(invalid)?;
        if let Some(classifier) = &self.classifier {
            check_segment("classifier", classifier).map_err(invalid)?;
        }
        Ok(())
    }

    /// Repository-relative path, the same layout a Maven repository uses.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.group_id.split('.') {
            path.push(segment);
        }
        path.push(&self.artifact_id);
        path.push(&self.version);
        path.push(self.file_name());
        path
    }

    /// Like [`relative_path`](Self::relative_path) but always `/`-separated,
    /// for building repository URLs.
    pub fn relative_url(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.file_name()
        )
    }

    /// Whether any of this coordinate's exclusions suppress `other`.
    pub fn excludes(&self, other: &DependencyCoordinate) -> bool {
        self.exclusions.iter().any(|p| p.matches_coordinate(other))
    }
}

fn check_segment(part: &str, segment: &str) -> std::result::Result<(), String> {
    if segment.is_empty() {
        return Err(format!("{part} has an empty segment"));
    }
    if segment == "." || segment == ".." {
        return Err(format!("{part} segment {segment:?} is not allowed"));
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err(format!("{part} {segment:?} contains a path separator"));
    }
    Ok(())
}

impl fmt::Display for DependencyCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_id())
    }
}

/// Builder for [`DependencyCoordinate`].
#[derive(Debug, Clone)]
pub struct CoordinateBuilder {
    group_id: String,
    artifact_id: String,
    version: String,
    classifier: Option<String>,
    md5: String,
    sha1: String,
    repository: Repository,
    transitive: bool,
    exclusions: Vec<ExclusionPattern>,
}

impl CoordinateBuilder {
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn artifact_id(mut self, artifact_id: impl Into<String>) -> Self {
        self.artifact_id = artifact_id.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = md5.into();
        self
    }

    pub fn sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = sha1.into();
        self
    }

    pub fn repository(mut self, repository: Repository) -> Self {
        self.repository = repository;
        self
    }

    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    pub fn exclusion(mut self, pattern: &str) -> Self {
        self.exclusions.push(ExclusionPattern::parse(pattern));
        self
    }

    pub fn exclusion_pattern(mut self, pattern: ExclusionPattern) -> Self {
        self.exclusions.push(pattern);
        self
    }

    pub fn build(self) -> DependencyCoordinate {
        DependencyCoordinate {
            group_id: self.group_id,
            artifact_id: self.artifact_id,
            version: self.version,
            classifier: self.classifier,
            md5: self.md5.to_ascii_lowercase(),
            sha1: self.sha1.to_ascii_lowercase(),
            repository: self.repository,
            transitive: self.transitive,
            exclusions: self.exclusions,
        }
    }
}
