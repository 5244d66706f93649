//! Route permission map: which codename a dashboard page requires.
//!
//! Routes are locale-qualified (`/en/orders`, `/ar/orders`, ...). A path that
//! is absent from the map, or mapped to an empty codename, requires no
//! permission beyond being logged in. Fully public pages (no authentication
//! at all) are listed separately.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{Permission, SessionFlags, has_permissions};

/// UI locales; every route exists once per locale prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ar,
    Fr,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Ar, Locale::Fr];

    pub fn prefix(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
            Locale::Fr => "fr",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Locale> {
        Self::ALL.into_iter().find(|l| l.prefix() == prefix)
    }

    /// Qualify a logical path (`/orders`) with this locale (`/en/orders`).
    pub fn qualify(&self, logical: &str) -> String {
        format!("/{}{}", self.prefix(), logical)
    }
}

/// Logical dashboard routes and the codename each one requires.
///
/// An empty codename marks "authenticated, no specific permission".
pub const DASHBOARD_ROUTES: &[(&str, &str)] = &[
    ("/dashboard", ""),
    ("/profile", ""),
    ("/blog", "view_post"),
    ("/blog/create", "add_post"),
    ("/blog/categories", "view_category"),
    ("/staff", "view_staff"),
    ("/staff/roles", "view_group"),
    ("/clients", "view_client"),
    ("/leads", "view_lead"),
    ("/coupons", "view_coupon"),
    ("/orders", "view_order"),
    ("/transactions", "view_transaction"),
    ("/translation-memory", "view_translationmemory"),
    ("/term-base", "view_termbase"),
    ("/notifications", "view_notification"),
    ("/integrations", "view_integration"),
];

/// Logical routes reachable without authentication.
pub const PUBLIC_ROUTES: &[&str] = &["/login", "/forgot-password", "/reset-password"];

/// How a route may be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess<'a> {
    /// No authentication required.
    Public,
    /// Any logged-in session.
    Authenticated,
    /// Logged in and holding this codename.
    Requires(&'a str),
}

/// A protected logical route that lacks a codename in some locales.
///
/// Lookups for those locale paths fall through to "no permission required".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageGap {
    pub route: String,
    pub codename: String,
    pub missing: Vec<Locale>,
}

#[derive(Debug, Clone, Default)]
pub struct RoutePermissionMap {
    entries: HashMap<String, String>,
    public: HashSet<String>,
}

static STANDARD: LazyLock<RoutePermissionMap> =
    LazyLock::new(|| RoutePermissionMap::localized(DASHBOARD_ROUTES, PUBLIC_ROUTES));

impl RoutePermissionMap {
    /// The dashboard's map, built once on first use.
    pub fn standard() -> &'static RoutePermissionMap {
        &STANDARD
    }

    /// Build a map by qualifying every logical route with every locale.
    pub fn localized(routes: &[(&str, &str)], public: &[&str]) -> Self {
        let entries = routes
            .iter()
            .flat_map(|(path, codename)| {
                Locale::ALL
                    .into_iter()
                    .map(move |l| (l.qualify(path), (*codename).to_string()))
            })
            .collect();

        let public = public
            .iter()
            .flat_map(|path| Locale::ALL.into_iter().map(move |l| l.qualify(path)))
            .collect();

        Self { entries, public }
    }

    /// Build a map from already-qualified paths.
    pub fn from_entries<E, P>(entries: E, public: P) -> Self
    where
        E: IntoIterator<Item = (String, String)>,
        P: IntoIterator<Item = String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(path, codename)| (normalize(&path).to_string(), codename))
                .collect(),
            public: public.into_iter().map(|p| normalize(&p).to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.contains(normalize(path))
    }

    /// Codename required to view `path`, if any.
    pub fn required_permission(&self, path: &str) -> Option<&str> {
        self.entries
            .get(normalize(path))
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }

    pub fn access(&self, path: &str) -> RouteAccess<'_> {
        if self.is_public(path) {
            return RouteAccess::Public;
        }
        match self.required_permission(path) {
            Some(codename) => RouteAccess::Requires(codename),
            None => RouteAccess::Authenticated,
        }
    }

    /// Route-guard decision for an authenticated session.
    pub fn can_view(&self, path: &str, flags: &SessionFlags, granted: &[Permission]) -> bool {
        match self.access(path) {
            RouteAccess::Public | RouteAccess::Authenticated => true,
            RouteAccess::Requires(codename) => {
                let allowed = has_permissions(flags, granted, &[codename]);
                if !allowed {
                    tracing::debug!(path, codename, "route guard denied page");
                }
                allowed
            }
        }
    }

    /// Protected routes whose codename is missing or empty in some locale.
    pub fn coverage_gaps(&self) -> Vec<CoverageGap> {
        let mut by_route: BTreeMap<&str, BTreeMap<Locale, &str>> = BTreeMap::new();
        for (path, codename) in &self.entries {
            if let Some((locale, logical)) = split_locale(path) {
                by_route.entry(logical).or_default().insert(locale, codename);
            }
        }

        by_route
            .into_iter()
            .filter_map(|(route, per_locale)| {
                let codename = per_locale.values().find(|c| !c.is_empty())?;
                let missing: Vec<Locale> = Locale::ALL
                    .into_iter()
                    .filter(|l| per_locale.get(l).is_none_or(|c| c.is_empty()))
                    .collect();
                (!missing.is_empty()).then(|| CoverageGap {
                    route: route.to_string(),
                    codename: codename.to_string(),
                    missing,
                })
            })
            .collect()
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn split_locale(path: &str) -> Option<(Locale, &str)> {
    let rest = path.strip_prefix('/')?;
    let (prefix, logical) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    Some((Locale::from_prefix(prefix)?, logical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn standard_map_covers_every_locale() {
        let map = RoutePermissionMap::standard();
        assert_eq!(map.len(), DASHBOARD_ROUTES.len() * Locale::ALL.len());
        assert!(map.coverage_gaps().is_empty());

        for locale in Locale::ALL {
            assert_eq!(
                map.required_permission(&locale.qualify("/orders")),
                Some("view_order")
            );
        }
    }

    #[test]
    fn unmapped_and_empty_routes_require_nothing() {
        let map = RoutePermissionMap::standard();
        assert_eq!(map.required_permission("/en/dashboard"), None);
        assert_eq!(map.required_permission("/en/unknown-page"), None);
        assert_eq!(map.access("/en/dashboard"), RouteAccess::Authenticated);
    }

    #[test]
    fn public_routes_are_distinct_from_authenticated_ones() {
        let map = RoutePermissionMap::standard();
        assert_eq!(map.access("/fr/login"), RouteAccess::Public);
        assert_eq!(map.access("/fr/profile"), RouteAccess::Authenticated);
        assert_eq!(map.access("/fr/coupons"), RouteAccess::Requires("view_coupon"));
    }

    #[test]
    fn lookup_ignores_trailing_slash_and_query() {
        let map = RoutePermissionMap::standard();
        assert_eq!(map.required_permission("/ar/leads/"), Some("view_lead"));
        assert_eq!(map.required_permission("/ar/leads?page=2"), Some("view_lead"));
    }

    #[test]
    fn can_view_consults_evaluator() {
        let map = RoutePermissionMap::standard();
        let editor = SessionFlags::with_role(Role::new("Editor"));
        let granted = vec![Permission::new("view_post")];

        assert!(map.can_view("/en/blog", &editor, &granted));
        assert!(!map.can_view("/en/transactions", &editor, &granted));
        assert!(map.can_view("/en/transactions", &SessionFlags::with_role(Role::ADMIN), &[]));
        assert!(map.can_view("/en/login", &SessionFlags::default(), &[]));
    }

    #[test]
    fn missing_locale_entry_is_reported_as_gap() {
        let map = RoutePermissionMap::from_entries(
            [
                ("/en/orders".to_string(), "view_order".to_string()),
                ("/ar/orders".to_string(), "".to_string()),
                ("/en/profile".to_string(), "".to_string()),
            ],
            ["/en/login".to_string()],
        );

        // The hazard itself: the French page falls through to "no permission".
        assert_eq!(map.required_permission("/fr/orders"), None);

        let gaps = map.coverage_gaps();
        assert_eq!(
            gaps,
            vec![CoverageGap {
                route: "/orders".to_string(),
                codename: "view_order".to_string(),
                missing: vec![Locale::Ar, Locale::Fr],
            }]
        );
    }
}
