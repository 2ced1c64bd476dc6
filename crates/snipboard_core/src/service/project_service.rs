//! User and project use-case service.
//!
//! # Responsibility
//! - Register users and resolve them by Zotero account id.
//! - Create, rename, open documents in and delete projects.
//!
//! # Invariants
//! - Project names are trimmed; blank or missing names fall back to
//!   [`DEFAULT_PROJECT_NAME`] on create and are rejected on rename.
//! - A project is only created for an existing owner.

use crate::model::project::{Project, ProjectId, DEFAULT_PROJECT_NAME};
use crate::model::user::{User, UserId};
use crate::model::ValidationError;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::info;
use thiserror::Error;

/// Service error for user and project use-cases.
#[derive(Debug, Error)]
pub enum ProjectServiceError {
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "user",
                id,
            } => Self::UserNotFound(id),
            RepoError::NotFound {
                entity: "project",
                id,
            } => Self::ProjectNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project service facade over repository implementations.
pub struct ProjectService<U: UserRepository, P: ProjectRepository> {
    users: U,
    projects: P,
}

impl<U: UserRepository, P: ProjectRepository> ProjectService<U, P> {
    pub fn new(users: U, projects: P) -> Self {
        Self { users, projects }
    }

    /// Creates a user, optionally linked to a Zotero account.
    pub fn register_user(&self, zotero_id: Option<&str>) -> ProjectServiceResult<User> {
        let zotero_id = zotero_id.map(str::trim).filter(|value| !value.is_empty());
        let user = self.users.create_user(zotero_id)?;
        info!(
            "event=user_register module=service status=ok user_id={} linked={}",
            user.id,
            user.zotero_id.is_some()
        );
        Ok(user)
    }

    /// Returns the oldest user linked to `zotero_id`, creating one if none is.
    pub fn user_for_zotero_id(&self, zotero_id: &str) -> ProjectServiceResult<User> {
        let zotero_id = zotero_id.trim();
        if zotero_id.is_empty() {
            return Err(ValidationError::Blank { field: "zotero id" }.into());
        }
        match self.users.find_by_zotero_id(zotero_id)?.into_iter().next() {
            Some(user) => Ok(user),
            None => self.register_user(Some(zotero_id)),
        }
    }

    pub fn get_user(&self, user_id: UserId) -> ProjectServiceResult<Option<User>> {
        Ok(self.users.get_user(user_id)?)
    }

    /// Deletes a user together with every project it owns.
    pub fn delete_user(&self, user_id: UserId) -> ProjectServiceResult<()> {
        self.users.delete_user(user_id)?;
        info!("event=user_delete module=service status=ok user_id={user_id}");
        Ok(())
    }

    /// Creates a project; a missing or blank name becomes the default name.
    pub fn create_project(
        &self,
        user_id: Option<UserId>,
        name: Option<&str>,
    ) -> ProjectServiceResult<Project> {
        if let Some(user_id) = user_id {
            if self.users.get_user(user_id)?.is_none() {
                return Err(ProjectServiceError::UserNotFound(user_id));
            }
        }

        let name = name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME);
        let project = self.projects.create_project(user_id, name)?;
        info!(
            "event=project_create module=service status=ok project_id={} owned={}",
            project.id,
            project.user_id.is_some()
        );
        Ok(project)
    }

    pub fn get_project(&self, project_id: ProjectId) -> ProjectServiceResult<Project> {
        self.projects
            .get_project(project_id)?
            .ok_or(ProjectServiceError::ProjectNotFound(project_id))
    }

    /// Lists a user's projects, most recently modified first.
    pub fn list_projects(&self, user_id: UserId) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.projects.list_projects(user_id)?)
    }

    pub fn rename_project(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> ProjectServiceResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Blank {
                field: "project name",
            }
            .into());
        }
        self.projects.rename_project(project_id, name)?;
        self.get_project(project_id)
    }

    /// Records the document open in the viewer. `None` or a blank path clears it.
    pub fn open_document(
        &self,
        project_id: ProjectId,
        path: Option<&str>,
    ) -> ProjectServiceResult<Project> {
        let path = path.map(str::trim).filter(|value| !value.is_empty());
        self.projects.set_active_document(project_id, path)?;
        self.get_project(project_id)
    }

    /// Deletes a project and its whole graph.
    pub fn delete_project(&self, project_id: ProjectId) -> ProjectServiceResult<()> {
        self.projects.delete_project(project_id)?;
        info!("event=project_delete module=service status=ok project_id={project_id}");
        Ok(())
    }
}
