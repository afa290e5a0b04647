//! Fixed names and values the operator is built around.

/// TCP port the directory service listens on and advertises.
pub const APPLICATION_PORT: u16 = 389;

/// Workload container name, as declared in `metadata.yaml`.
pub const CONTAINER_NAME: &str = "openldap";

/// Pebble service (and layer label) managed inside the container.
pub const SERVICE_NAME: &str = "openldap";

/// Entrypoint of the OpenLDAP image.
pub const SERVICE_COMMAND: &str = "/container/tool/run";

/// Peer relation endpoint holding the shared application state.
pub const PEER_RELATION: &str = "peer";

/// Relation endpoint over which LDAP credentials are provided.
pub const LDAP_RELATION: &str = "ldap";

/// Configuration option holding the directory base DN.
pub const BASE_DN_OPTION: &str = "ldap-base-dn";

/// Configuration option holding the hostname used in the advertised URL.
pub const DEPLOYMENT_NAME_OPTION: &str = "charm-deployment-name";

/// Options the reconciler refuses to run without.
pub const REQUIRED_OPTIONS: [&str; 1] = [BASE_DN_OPTION];

/// Directory administrator account name.
pub const ADMIN_USERNAME: &str = "admin";

/// Length of the generated administrator password.
pub const PASSWORD_LENGTH: usize = 12;

/// Where the charm's `templates/` directory lands inside the container.
pub const TEMPLATES_DIR: &str = "/templates";

/// LDIF file with the sample users and groups, relative to [`TEMPLATES_DIR`].
pub const TEST_USERS_LDIF: &str = "startup.ldif";

/// URL used for one-off commands executed next to the server.
pub const LOCAL_LDAP_URL: &str = "ldap://localhost:389";
