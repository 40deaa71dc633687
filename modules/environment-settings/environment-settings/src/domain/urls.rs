//! URL construction for the admin and data-service endpoints.

use url::{ParseError, Url};

const ENVIRONMENTS_PATH: [&str; 5] = [
    "providers",
    "Microsoft.BusinessAppPlatform",
    "scopes",
    "admin",
    "environments",
];

fn https_base(host: &str) -> Result<Url, ParseError> {
    let url = Url::parse(&format!("https://{host}/"))?;
    // A host containing a path, query or fragment is not a host.
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ParseError::InvalidDomainCharacter);
    }
    Ok(url)
}

fn with_segments(mut url: Url, segments: &[&str]) -> Result<Url, ParseError> {
    url.path_segments_mut()
        .map_err(|()| ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `https://{bapi_host}/providers/.../environments/{id}?api-version={version}`
///
/// The environment id is always a single path segment.
pub fn environment_url(
    bapi_host: &str,
    api_version: &str,
    environment_id: &str,
) -> Result<Url, ParseError> {
    let mut segments = ENVIRONMENTS_PATH.to_vec();
    segments.push(environment_id);
    let mut url = with_segments(https_base(bapi_host)?, &segments)?;
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

/// `https://{host}/api/data/{version}/organizations`
pub fn organizations_url(host: &str, api_version: &str) -> Result<Url, ParseError> {
    with_segments(
        https_base(host)?,
        &["api", "data", api_version, "organizations"],
    )
}

/// `https://{host}/api/data/{version}/organizations({organization_id})`
pub fn organization_url(
    host: &str,
    api_version: &str,
    organization_id: &str,
) -> Result<Url, ParseError> {
    let record = format!("organizations({organization_id})");
    with_segments(https_base(host)?, &["api", "data", api_version, &record])
}

/// Host of a linked instance URL.
///
/// One trailing slash is stripped first; an empty remainder means the
/// environment is not linked and yields `Ok(None)`. The result keeps a
/// non-default port. Scheme and path are discarded.
pub fn instance_host(instance_url: &str) -> Result<Option<String>, ParseError> {
    let trimmed = instance_url.strip_suffix('/').unwrap_or(instance_url);
    if trimmed.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(trimmed)?;
    let host = url.host_str().ok_or(ParseError::EmptyHost)?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Ok(Some(host))
}
