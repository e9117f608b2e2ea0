//! PetClinic API surface exercised by the virtual users

/// Owners collection: listed with GET, created with POST
pub const OWNERS: &str = "/api/customer/owners";

/// Stats name that groups every `/api/customer/owners/{id}` request
pub const OWNER_BY_ID_NAME: &str = "/api/customer/owners/[id]";

/// Vets collection
pub const VETS: &str = "/api/vet/vets";

/// Endpoint names selected for per-endpoint analysis.
///
/// GET and POST on the owners collection share one name, so the list holds
/// three names for four endpoints.
pub const ENDPOINT_ALLOW_LIST: [&str; 3] = [OWNERS, OWNER_BY_ID_NAME, VETS];

/// Request path for a single owner
pub fn owner_path(id: u64) -> String {
    format!("{}/{}", OWNERS, id)
}

/// Whether a stats row name is part of the per-endpoint analysis
pub fn is_tracked_endpoint(name: &str) -> bool {
    ENDPOINT_ALLOW_LIST.contains(&name)
}

/// Display label combining HTTP method and stats name, e.g. `POST /api/customer/owners`
pub fn endpoint_label(method: &str, name: &str) -> String {
    format!("{} {}", method, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_path() {
        assert_eq!(owner_path(7), "/api/customer/owners/7");
    }

    #[test]
    fn test_tracked_endpoints() {
        assert!(is_tracked_endpoint("/api/customer/owners"));
        assert!(is_tracked_endpoint("/api/customer/owners/[id]"));
        assert!(is_tracked_endpoint("/api/vet/vets"));
        assert!(!is_tracked_endpoint("/api/customer/owners/3"));
        assert!(!is_tracked_endpoint("Aggregated"));
    }

    #[test]
    fn test_endpoint_label() {
        assert_eq!(endpoint_label("GET", VETS), "GET /api/vet/vets");
    }
}
