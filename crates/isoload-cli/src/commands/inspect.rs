use std::path::{Path, PathBuf};

use isoload_config::IsoConfig;
use isoload_core::{DependencyCoordinate, IsoError, Result};
use isoload_resolver::{ArtifactCache, verify_file};

pub(super) fn cmd_verify(file: &Path, md5: &str, sha1: &str) -> Result<()> {
    verify_file(file, md5, sha1)?;
    println!("✅ {} matches both digests", file.display());
    Ok(())
}

pub(super) fn cmd_path(
    config: &IsoConfig,
    coordinate: &str,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    let coordinate = parse_coordinate(coordinate)?;
    let cache = ArtifactCache::new(cache_dir.unwrap_or_else(|| config.resolver.cache_dir.clone()));
    println!("{}", cache.path_for(&coordinate).display());
    Ok(())
}

/// Parse `group:artifact:version[:classifier]`. Digests are left empty.
fn parse_coordinate(raw: &str) -> Result<DependencyCoordinate> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (group, artifact, version, classifier) = match parts.as_slice() {
        [g, a, v] => (g, a, v, None),
        [g, a, v, c] => (g, a, v, Some(c)),
        _ => {
            return Err(IsoError::Config(format!(
                "expected GROUP:ARTIFACT:VERSION[:CLASSIFIER], got {raw:?}"
            )));
        }
    };
    let mut builder = DependencyCoordinate::builder(*group, *artifact, *version, "", "");
    if let Some(c) = classifier {
        builder = builder.classifier(*c);
    }
    let coordinate = builder.build();
    coordinate.validate()?;
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_and_four_parts() {
        let c = parse_coordinate("org.example:lib:1.2").unwrap();
        assert_eq!(c.display_id(), "org.example:lib:1.2");
        let c = parse_coordinate("org.example:lib:1.2:sources").unwrap();
        assert_eq!(c.classifier(), Some("sources"));
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(parse_coordinate("org.example:lib").is_err());
        assert!(parse_coordinate("a:b:c:d:e").is_err());
        assert!(parse_coordinate("org.example::1.0").is_err());
        assert!(matches!(
            parse_coordinate("org.example:..:1.0"),
            Err(IsoError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn path_follows_repository_layout() {
        let cache = ArtifactCache::new("/cache");
        let c = parse_coordinate("org.example:lib:1.2:sources").unwrap();
        assert_eq!(
            cache.path_for(&c),
            PathBuf::from("/cache/org/example/lib/1.2/lib-1.2-sources.jar")
        );
    }

    #[test]
    fn verify_reports_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lib.jar");
        std::fs::write(&file, b"abc").unwrap();
        let md5 = "900150983cd24fb0d6963f7d28e17f72";
        assert!(cmd_verify(&file, md5, "a9993e364706816aba3e25717850c26c9cd0d89d").is_ok());
        assert!(cmd_verify(&file, md5, &"0".repeat(40)).is_err());
    }
}
