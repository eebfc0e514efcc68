//! End-to-end scenarios every backend must pass.
//!
//! Each scenario is self-contained: run it against a fresh, empty store.

use std::fmt;

use rolegate::{Authorizer, AuthzError, PolicyStore};
use rolegate_core::{Actor, DomainError, Entity, Permission};

/// One call and the outcome it must produce.
#[derive(Debug, Clone)]
pub enum Step {
    CreateRole {
        name: &'static str,
        permissions: &'static [(&'static str, &'static str)],
        expect: Expect,
    },
    FindRole {
        name: &'static str,
        expect: Expect,
    },
    DeleteRole {
        name: &'static str,
        expect: Expect,
    },
    AssignRole {
        role: &'static str,
        actor: (&'static str, &'static str),
        expect: Expect,
    },
    HasRole {
        role: &'static str,
        actor: (&'static str, &'static str),
        expect: Expect,
    },
    HasPermission {
        actor: (&'static str, &'static str),
        permission: &'static str,
        resource: &'static str,
        expect: Expect,
    },
    ListResourcePatterns {
        actor: (&'static str, &'static str),
        permission: &'static str,
        expect: Expect,
    },
}

/// Expected outcome of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// Succeeds; the value is not inspected beyond its identity.
    Ok,
    /// Fails with exactly this domain error.
    Fails(DomainError),
    /// A decision answering this.
    Is(bool),
    /// Exactly these patterns, in sorted order.
    Patterns(&'static [&'static str]),
}

/// What a step actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Ok,
    /// The call failed; `None` for a fault that is not a domain error.
    Failed(Option<DomainError>),
    /// The call succeeded with the wrong value.
    Mismatch(String),
    Is(bool),
    Patterns(Vec<String>),
}

impl Observed {
    fn matches(&self, expect: &Expect) -> bool {
        match (self, expect) {
            (Observed::Ok, Expect::Ok) => true,
            (Observed::Failed(got), Expect::Fails(want)) => got.as_ref() == Some(want),
            (Observed::Is(a), Expect::Is(b)) => a == b,
            (Observed::Patterns(got), Expect::Patterns(want)) => {
                got.iter().map(String::as_str).eq(want.iter().copied())
            }
            _ => false,
        }
    }
}

/// A named sequence of steps.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

/// A scenario step that did not produce its expected outcome.
#[derive(Debug, Clone)]
pub struct ScenarioFailure {
    pub scenario: &'static str,
    pub step: usize,
    pub expected: Expect,
    pub observed: Observed,
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scenario '{}' step {}: expected {:?}, observed {:?}",
            self.scenario, self.step, self.expected, self.observed
        )
    }
}

impl std::error::Error for ScenarioFailure {}

const BILLING: &str = "billing-admin";
const U1: (&str, &str) = ("u1", "uaa");
const U2: (&str, &str) = ("u2", "uaa");
const U3: (&str, &str) = ("u3", "uaa");
const INVOICE_READ_ORG42: &[(&str, &str)] = &[("invoice.read", "org:42")];

fn create_billing() -> Step {
    Step::CreateRole {
        name: BILLING,
        permissions: INVOICE_READ_ORG42,
        expect: Expect::Ok,
    }
}

fn assign_u1() -> Step {
    Step::AssignRole {
        role: BILLING,
        actor: U1,
        expect: Expect::Ok,
    }
}

/// Get all end-to-end scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "create then find a role",
            steps: vec![
                create_billing(),
                Step::FindRole {
                    name: BILLING,
                    expect: Expect::Ok,
                },
            ],
        },
        Scenario {
            name: "assigned permission is exact",
            steps: vec![
                create_billing(),
                assign_u1(),
                Step::HasPermission {
                    actor: U1,
                    permission: "invoice.read",
                    resource: "org:42",
                    expect: Expect::Is(true),
                },
                Step::HasPermission {
                    actor: U1,
                    permission: "invoice.read",
                    resource: "org:99",
                    expect: Expect::Is(false),
                },
            ],
        },
        Scenario {
            name: "repeated assignment fails and keeps the role",
            steps: vec![
                create_billing(),
                assign_u1(),
                Step::AssignRole {
                    role: BILLING,
                    actor: U1,
                    expect: Expect::Fails(DomainError::AlreadyExists(Entity::Assignment)),
                },
                Step::HasRole {
                    role: BILLING,
                    actor: U1,
                    expect: Expect::Is(true),
                },
            ],
        },
        Scenario {
            name: "delete cascades to assignments",
            steps: vec![
                create_billing(),
                assign_u1(),
                Step::DeleteRole {
                    name: BILLING,
                    expect: Expect::Ok,
                },
                Step::HasRole {
                    role: BILLING,
                    actor: U1,
                    expect: Expect::Is(false),
                },
                Step::FindRole {
                    name: BILLING,
                    expect: Expect::Fails(DomainError::NotFound(Entity::Role)),
                },
            ],
        },
        Scenario {
            name: "unknown role fails to assign but decides false",
            steps: vec![
                Step::AssignRole {
                    role: "ghost-role",
                    actor: U2,
                    expect: Expect::Fails(DomainError::NotFound(Entity::Role)),
                },
                Step::HasRole {
                    role: "ghost-role",
                    actor: U2,
                    expect: Expect::Is(false),
                },
            ],
        },
        Scenario {
            name: "patterns granted twice are listed once",
            steps: vec![
                create_billing(),
                Step::CreateRole {
                    name: "invoice-auditor",
                    permissions: INVOICE_READ_ORG42,
                    expect: Expect::Ok,
                },
                Step::AssignRole {
                    role: BILLING,
                    actor: U3,
                    expect: Expect::Ok,
                },
                Step::AssignRole {
                    role: "invoice-auditor",
                    actor: U3,
                    expect: Expect::Ok,
                },
                Step::ListResourcePatterns {
                    actor: U3,
                    permission: "invoice.read",
                    expect: Expect::Patterns(&["org:42"]),
                },
            ],
        },
    ]
}

fn actor((id, issuer): (&str, &str)) -> Actor {
    Actor::new(id, issuer)
}

fn observe<T>(result: Result<T, AuthzError>, f: impl FnOnce(T) -> Observed) -> Observed {
    match result {
        Ok(v) => f(v),
        Err(e) => Observed::Failed(e.domain().cloned()),
    }
}

async fn run_step<S: PolicyStore>(authz: &Authorizer<S>, step: &Step) -> (Expect, Observed) {
    match step {
        Step::CreateRole {
            name,
            permissions,
            expect,
        } => {
            let permissions: Vec<Permission> = permissions
                .iter()
                .map(|(n, r)| Permission::new(*n, *r))
                .collect();
            let result = authz.create_role(name, &permissions).await;
            let observed = observe(result, |role| {
                if role.name == *name {
                    Observed::Ok
                } else {
                    Observed::Mismatch(format!("created role named {}", role.name))
                }
            });
            (expect.clone(), observed)
        }
        Step::FindRole { name, expect } => {
            let observed = observe(authz.find_role(name).await, |role| {
                if role.name == *name {
                    Observed::Ok
                } else {
                    Observed::Mismatch(format!("found role named {}", role.name))
                }
            });
            (expect.clone(), observed)
        }
        Step::DeleteRole { name, expect } => {
            let observed = observe(authz.delete_role(name).await, |()| Observed::Ok);
            (expect.clone(), observed)
        }
        Step::AssignRole {
            role,
            actor: a,
            expect,
        } => {
            let observed = observe(authz.assign_role(role, &actor(*a)).await, |()| Observed::Ok);
            (expect.clone(), observed)
        }
        Step::HasRole {
            role,
            actor: a,
            expect,
        } => {
            let observed = observe(authz.has_role(&actor(*a), role).await, Observed::Is);
            (expect.clone(), observed)
        }
        Step::HasPermission {
            actor: a,
            permission,
            resource,
            expect,
        } => {
            let result = authz.has_permission(&actor(*a), permission, resource).await;
            (expect.clone(), observe(result, Observed::Is))
        }
        Step::ListResourcePatterns {
            actor: a,
            permission,
            expect,
        } => {
            let result = authz.list_resource_patterns(&actor(*a), permission).await;
            let observed = observe(result, |set| Observed::Patterns(set.into_iter().collect()));
            (expect.clone(), observed)
        }
    }
}

/// Run one scenario, stopping at the first mismatch.
pub async fn run_scenario<S: PolicyStore>(
    authz: &Authorizer<S>,
    scenario: &Scenario,
) -> Result<(), ScenarioFailure> {
    for (i, step) in scenario.steps.iter().enumerate() {
        let (expected, observed) = run_step(authz, step).await;
        if !observed.matches(&expected) {
            return Err(ScenarioFailure {
                scenario: scenario.name,
                step: i,
                expected,
                observed,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenarios_are_named_uniquely() {
        let scenarios = all_scenarios();
        let mut names: Vec<_> = scenarios.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn test_failed_observation_matches_domain_error() {
        let observed = Observed::Failed(Some(DomainError::NotFound(Entity::Role)));
        assert!(observed.matches(&Expect::Fails(DomainError::NotFound(Entity::Role))));
        assert!(!observed.matches(&Expect::Fails(DomainError::NotFound(Entity::Actor))));
        assert!(!observed.matches(&Expect::Ok));
    }

    #[test]
    fn test_fault_never_matches_domain_error() {
        let observed = Observed::Failed(None);
        assert!(!observed.matches(&Expect::Fails(DomainError::NotFound(Entity::Role))));

        let observed = Observed::Mismatch("found role named role not found".into());
        assert!(!observed.matches(&Expect::Fails(DomainError::NotFound(Entity::Role))));
        assert!(!observed.matches(&Expect::Ok));
    }
}
