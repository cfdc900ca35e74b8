//! Role-based access policy.
//!
//! Every protected operation is named by an [`Action`]. [`access`] maps a
//! `(Role, Action)` pair to an [`Access`] decision. The table is static and
//! has no HTTP dependencies, so it can be tested exhaustively.

use crate::types::Role;

/// Protected operations exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListUsers,
    ViewUser,
    UpdateUser,
    ArchiveUser,
    DeleteUser,
    CreateDiagnosis,
    ViewDiagnoses,
    UpdateDiagnosis,
    SearchDiagnoses,
    PrescribeMedication,
    ViewMedications,
    UpdateMedication,
    CreateGoal,
    ViewGoals,
    UpdateGoal,
    RecordVital,
    ViewVitals,
    ScheduleAppointment,
    ViewAppointments,
    UpdateAppointment,
    ViewNotifications,
}

/// Outcome of a policy lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The role may perform the action on any record.
    Allow,
    /// The role may perform the action only on records it owns.
    OwnOnly,
    /// The role may not perform the action.
    Deny,
}

impl Access {
    pub fn is_denied(&self) -> bool {
        matches!(self, Access::Deny)
    }
}

const ALL_ROLES: [Role; 3] = [Role::Patient, Role::Doctor, Role::Admin];

/// Looks up what `role` may do for `action`.
pub fn access(role: Role, action: Action) -> Access {
    use Access::*;
    use Action::*;

    match (role, action) {
        // Notifications are private to their recipient, admins included.
        (_, ViewNotifications) => OwnOnly,

        (Role::Admin, _) => Allow,

        (Role::Doctor, ListUsers | ViewUser) => Allow,
        (Role::Doctor, UpdateUser) => OwnOnly,
        (Role::Doctor, ArchiveUser | DeleteUser) => Deny,
        (
            Role::Doctor,
            CreateDiagnosis | ViewDiagnoses | UpdateDiagnosis | SearchDiagnoses,
        ) => Allow,
        (Role::Doctor, PrescribeMedication | ViewMedications | UpdateMedication) => Allow,
        (Role::Doctor, CreateGoal | ViewGoals | UpdateGoal) => Allow,
        (Role::Doctor, RecordVital | ViewVitals) => Allow,
        (Role::Doctor, ScheduleAppointment | ViewAppointments | UpdateAppointment) => OwnOnly,

        (Role::Patient, ViewUser | UpdateUser) => OwnOnly,
        (Role::Patient, ViewDiagnoses | ViewMedications | ViewGoals | UpdateGoal) => OwnOnly,
        (Role::Patient, RecordVital | ViewVitals) => OwnOnly,
        (Role::Patient, ScheduleAppointment | ViewAppointments | UpdateAppointment) => OwnOnly,
        (Role::Patient, _) => Deny,
    }
}

/// Roles that are not denied `action`, in declaration order.
pub fn allowed_roles(action: Action) -> Vec<Role> {
    ALL_ROLES
        .into_iter()
        .filter(|role| !access(*role, action).is_denied())
        .collect()
}

/// The 403 message for a role that was denied `action`, e.g. `"doctor or admin role required"`.
pub fn denial_message(action: Action) -> String {
    let roles: Vec<&str> = allowed_roles(action).iter().map(Role::as_str).collect();
    format!("{} role required", roles.join(" or "))
}
