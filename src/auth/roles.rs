use serde::{Deserialize, Serialize};

/// Dashboard roles, highest privilege first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Organizer,
    Judge,
    Mentor,
    Participant,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Organizer,
        Role::Judge,
        Role::Mentor,
        Role::Participant,
    ];

    /// Parse a backend role name. Accepts any case and an optional `ROLE_` prefix.
    pub fn parse(name: &str) -> Option<Role> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match bare {
            "ADMIN" => Some(Role::Admin),
            "ORGANIZER" => Some(Role::Organizer),
            "JUDGE" => Some(Role::Judge),
            "MENTOR" => Some(Role::Mentor),
            "PARTICIPANT" => Some(Role::Participant),
            _ => None,
        }
    }

    /// Parse every known role name, dropping the rest. Result is sorted and deduplicated.
    pub fn parse_all(names: &[String]) -> Vec<Role> {
        let mut roles: Vec<Role> = names
            .iter()
            .filter_map(|n| {
                let role = Role::parse(n);
                if role.is_none() {
                    tracing::debug!("Ignoring unknown role {n}");
                }
                role
            })
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Organizer => "ORGANIZER",
            Role::Judge => "JUDGE",
            Role::Mentor => "MENTOR",
            Role::Participant => "PARTICIPANT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Organizer => "Organizer",
            Role::Judge => "Judge",
            Role::Mentor => "Mentor",
            Role::Participant => "Participant",
        }
    }

    /// Landing page for the role.
    pub fn home(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Organizer => "/organizer",
            Role::Judge => "/judge",
            Role::Mentor => "/mentor",
            Role::Participant => "/participant",
        }
    }

    /// The highest-privilege role held.
    pub fn primary(roles: &[Role]) -> Option<Role> {
        roles.iter().min().copied()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True iff `held` and `allowed` share at least one role.
pub fn intersects(held: &[Role], allowed: &[Role]) -> bool {
    held.iter().any(|r| allowed.contains(r))
}
