use crate::shared::DefinitionKey;

pub const ROUTE_PREFIX: &str = "slide-viewer";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route `{route}` does not start with `slide-viewer/`")]
    WrongPrefix { route: String },
    #[error("route `{route}` has no definition key")]
    MissingKey { route: String },
    #[error("route `{route}` segment `{segment}` is not valid percent-encoding")]
    BadEncoding { route: String, segment: String },
    #[error("route `{route}`: invalid definition key: {reason}")]
    InvalidKey { route: String, reason: String },
    #[error("route `{route}` has too many segments")]
    TooManySegments { route: String },
}

/// `slide-viewer/<definition key>/<docname?>/<starting slide?>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideViewerRoute {
    pub key: DefinitionKey,
    pub docname: Option<String>,
    pub starting_slide: usize,
}

impl SlideViewerRoute {
    pub fn new(key: DefinitionKey) -> Self {
        Self {
            key,
            docname: None,
            starting_slide: 0,
        }
    }

    pub fn parse(route: &str) -> Result<Self, RouteError> {
        let trimmed = route.trim().trim_matches('/');
        let mut segments = trimmed.split('/');
        if segments.next() != Some(ROUTE_PREFIX) {
            return Err(RouteError::WrongPrefix {
                route: route.to_string(),
            });
        }
        let decode = |segment: &str| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .map_err(|_| RouteError::BadEncoding {
                    route: route.to_string(),
                    segment: segment.to_string(),
                })
        };

        let key = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| RouteError::MissingKey {
                route: route.to_string(),
            })?;
        let key = DefinitionKey::parse(&decode(key)?).map_err(|reason| RouteError::InvalidKey {
            route: route.to_string(),
            reason,
        })?;
        let docname = match segments.next().filter(|segment| !segment.is_empty()) {
            Some(segment) => Some(decode(segment)?),
            None => None,
        };
        // A non-numeric index falls back to the first slide.
        let starting_slide = segments
            .next()
            .and_then(|segment| decode(segment).ok())
            .and_then(|segment| segment.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if segments.next().is_some() {
            return Err(RouteError::TooManySegments {
                route: route.to_string(),
            });
        }
        Ok(Self {
            key,
            docname,
            starting_slide,
        })
    }

    pub fn to_path(&self) -> String {
        let mut path = format!("{ROUTE_PREFIX}/{}", urlencoding::encode(self.key.as_str()));
        if self.docname.is_some() || self.starting_slide > 0 {
            path.push('/');
            path.push_str(&urlencoding::encode(self.docname.as_deref().unwrap_or_default()));
        }
        if self.starting_slide > 0 {
            path.push_str(&format!("/{}", self.starting_slide));
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_segments_percent_decoded() {
        let route = SlideViewerRoute::parse("slide-viewer/customer%20setup/ACME%2FEU/2").expect("route");
        assert_eq!(route.key.as_str(), "customer setup");
        assert_eq!(route.docname.as_deref(), Some("ACME/EU"));
        assert_eq!(route.starting_slide, 2);
        assert_eq!(route.to_path(), "slide-viewer/customer%20setup/ACME%2FEU/2");
    }

    #[test]
    fn optional_segments_default() {
        let route = SlideViewerRoute::parse("/slide-viewer/onboarding/").expect("route");
        assert_eq!(route.docname, None);
        assert_eq!(route.starting_slide, 0);

        let route = SlideViewerRoute::parse("slide-viewer/onboarding/new-x/abc").expect("route");
        assert_eq!(route.starting_slide, 0);
    }

    #[test]
    fn rejects_foreign_routes() {
        assert!(matches!(
            SlideViewerRoute::parse("app/customer"),
            Err(RouteError::WrongPrefix { .. })
        ));
        assert!(matches!(
            SlideViewerRoute::parse("slide-viewer"),
            Err(RouteError::MissingKey { .. })
        ));
    }
}
