/// Parsed absolute URL, split the way `location` exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocationParts {
    pub(crate) scheme: String,
    /// `host[:port]`; `None` for opaque URLs such as `about:blank`.
    pub(crate) authority: Option<String>,
    pub(crate) pathname: String,
    pub(crate) search: String,
    pub(crate) hash: String,
}

impl LocationParts {
    pub(crate) fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let scheme_end = trimmed.find(':')?;
        let scheme = trimmed[..scheme_end].to_ascii_lowercase();
        if !is_valid_url_scheme(&scheme) {
            return None;
        }
        let rest = &trimmed[scheme_end + 1..];
        if let Some(without_slashes) = rest.strip_prefix("//") {
            let authority_end = without_slashes
                .find(['/', '?', '#'])
                .unwrap_or(without_slashes.len());
            let authority = without_slashes[..authority_end].to_ascii_lowercase();
            let (pathname, search, hash) = split_path_search_hash(&without_slashes[authority_end..]);
            let pathname = if pathname.is_empty() {
                "/".to_string()
            } else {
                normalize_pathname(&pathname)
            };
            Some(Self {
                scheme,
                authority: Some(authority),
                pathname,
                search,
                hash,
            })
        } else {
            let (pathname, search, hash) = split_path_search_hash(rest);
            Some(Self {
                scheme,
                authority: None,
                pathname,
                search,
                hash,
            })
        }
    }

    pub(crate) fn href(&self) -> String {
        match &self.authority {
            Some(authority) => format!(
                "{}://{}{}{}{}",
                self.scheme, authority, self.pathname, self.search, self.hash
            ),
            None => format!(
                "{}:{}{}{}",
                self.scheme, self.pathname, self.search, self.hash
            ),
        }
    }
}

fn is_valid_url_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

fn split_path_search_hash(tail: &str) -> (String, String, String) {
    let (before_hash, hash) = match tail.find('#') {
        Some(pos) => (&tail[..pos], tail[pos..].to_string()),
        None => (tail, String::new()),
    };
    let (path, search) = match before_hash.find('?') {
        Some(pos) => (&before_hash[..pos], before_hash[pos..].to_string()),
        None => (before_hash, String::new()),
    };
    (path.to_string(), normalize_prefixed(search, '?'), normalize_prefixed(hash, '#'))
}

/// A lone `?` or `#` carries no component.
fn normalize_prefixed(component: String, prefix: char) -> String {
    if component.len() == prefix.len_utf8() {
        String::new()
    } else {
        component
    }
}

fn normalize_pathname(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let trailing_slash = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut out = format!("/{}", segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        out.push('/');
    }
    out
}

/// Resolves `input` against the absolute URL `base`, returning an absolute
/// href. Empty input resolves to the base itself.
pub(crate) fn resolve_location(base: &str, input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return base.to_string();
    }
    if let Some(parts) = LocationParts::parse(input) {
        return parts.href();
    }
    let Some(mut next) = LocationParts::parse(base) else {
        return input.to_string();
    };

    if input.starts_with("//") {
        return LocationParts::parse(&format!("{}:{input}", next.scheme))
            .map(|parts| parts.href())
            .unwrap_or_else(|| input.to_string());
    }

    if input.starts_with('#') {
        next.hash = normalize_prefixed(input.to_string(), '#');
        return next.href();
    }

    let (path, search, hash) = split_path_search_hash(input);
    if path.is_empty() {
        next.search = search;
        next.hash = hash;
        return next.href();
    }

    next.pathname = if path.starts_with('/') || next.authority.is_none() {
        normalize_pathname(&path)
    } else {
        let base_dir = match next.pathname.rsplit_once('/') {
            Some((prefix, _)) => format!("{prefix}/"),
            None => "/".to_string(),
        };
        normalize_pathname(&format!("{base_dir}{path}"))
    };
    next.search = search;
    next.hash = hash;
    next.href()
}
