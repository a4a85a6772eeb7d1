//! Container path and output file name helpers.
//!
//! Container paths are `/`-delimited labels such as
//! `assets/live2d/hiyori/hiyori.moc3.bytes`. They are never touched on disk
//! directly; these helpers only slice them.

/// Path with the last `/` segment removed, or the whole path if it has no separator.
#[inline]
pub fn base_path(container: &str) -> &str {
    match container.rfind('/') {
        Some(idx) => &container[..idx],
        None => container,
    }
}

/// Last `/`-delimited segment.
#[inline]
pub fn last_segment(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// True if `segment` appears as a whole `/`-delimited token in `path`.
pub fn has_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|s| s == segment)
}

/// File name without its final extension (`a/b/c.motion3.json` -> `c.motion3`).
pub fn file_stem(path: &str) -> &str {
    let name = last_segment(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Path with the extension of its last segment removed.
pub fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(0) | None => path,
        Some(idx) => &path[..name_start + idx],
    }
}

/// Stable collision suffix for an output name (`body` -> `body_#42`).
#[inline]
pub fn disambiguate(name: &str, id: i64) -> String {
    format!("{}_#{}", name, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path() {
        assert_eq!(base_path("a/b/x.moc3"), "a/b");
        assert_eq!(base_path("x.moc3"), "x.moc3");
    }

    #[test]
    fn test_segments() {
        assert_eq!(last_segment("a/b/hiyori"), "hiyori");
        assert!(has_segment("assets/hiyori/tex.png", "hiyori"));
        assert!(!has_segment("assets/hiyori_pro/tex.png", "hiyori"));
    }

    #[test]
    fn test_stems() {
        assert_eq!(file_stem("motions/idle.motion3.json"), "idle.motion3");
        assert_eq!(file_stem("idle"), "idle");
        assert_eq!(strip_extension("a.b/c/model.prefab"), "a.b/c/model");
        assert_eq!(strip_extension("a.b/c/model"), "a.b/c/model");
    }

    #[test]
    fn test_disambiguate() {
        assert_eq!(disambiguate("body", 7), "body_#7");
    }
}
