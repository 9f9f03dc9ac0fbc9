//! Agent (artist/organizer) use-case service.

use crate::model::agent::{Agent, AgentKind};
use crate::model::RecordId;
use crate::repo::agent_repo::{AgentListQuery, AgentRepository};
use crate::repo::RepoResult;
use crate::service::derive_slug;
use log::info;

/// Request model for creating an artist or organizer profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAgent {
    pub name: String,
    /// Explicit slug; derived from `name` when `None` or blank.
    pub slug: Option<String>,
    /// Raw handle as typed (`@handle` accepted).
    pub instagram: Option<String>,
    pub bio: Option<String>,
    pub city_id: Option<RecordId>,
}

/// Use-case service wrapper for agent operations.
pub struct AgentService<R: AgentRepository> {
    repo: R,
}

impl<R: AgentRepository> AgentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_artist(&self, request: &NewAgent) -> RepoResult<RecordId> {
        self.create_agent(AgentKind::Artist, request)
    }

    pub fn create_organizer(&self, request: &NewAgent) -> RepoResult<RecordId> {
        self.create_agent(AgentKind::Organizer, request)
    }

    pub fn update_agent(&self, agent: &Agent) -> RepoResult<()> {
        self.repo.update_agent(agent)
    }

    pub fn get_agent(&self, id: RecordId) -> RepoResult<Option<Agent>> {
        self.repo.get_agent(id, false)
    }

    pub fn list_agents(&self, query: &AgentListQuery) -> RepoResult<Vec<Agent>> {
        self.repo.list_agents(query)
    }

    pub fn soft_delete_agent(&self, id: RecordId) -> RepoResult<()> {
        self.repo.soft_delete_agent(id)
    }

    fn create_agent(&self, kind: AgentKind, request: &NewAgent) -> RepoResult<RecordId> {
        let slug = derive_slug(request.slug.as_deref(), &request.name, "name")?;
        let mut agent = Agent::new(kind, request.name.trim(), slug);
        if let Some(raw) = request.instagram.as_deref() {
            agent.set_instagram(raw);
        }
        agent.bio = request.bio.clone();
        agent.city_id = request.city_id;

        let id = self.repo.create_agent(&agent)?;
        info!(
            "event=agent_create module=service status=ok kind={} agent_id={}",
            kind.as_str(),
            id
        );
        Ok(id)
    }
}
