//! Agent (artist/organizer) repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Slugs are unique per `kind`, enforced by `UNIQUE (kind, slug)`.
//! - `search_name` is rewritten on every name change.

use crate::model::agent::{Agent, AgentKind};
use crate::model::slug::fold_for_search;
use crate::model::RecordId;
use crate::repo::{
    bool_to_int, map_slug_write_error, parse_bool, parse_optional_record_id, parse_record_id,
    push_pagination, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const AGENT_SELECT_SQL: &str = "SELECT
    id,
    kind,
    name,
    slug,
    instagram,
    bio,
    city_id,
    is_deleted
FROM agents";

/// Query options for listing agents.
#[derive(Debug, Clone, Default)]
pub struct AgentListQuery {
    pub kind: Option<AgentKind>,
    pub city_id: Option<RecordId>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for agent CRUD operations.
pub trait AgentRepository {
    fn create_agent(&self, agent: &Agent) -> RepoResult<RecordId>;
    fn update_agent(&self, agent: &Agent) -> RepoResult<()>;
    fn get_agent(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Agent>>;
    fn get_agent_by_slug(&self, kind: AgentKind, slug: &str) -> RepoResult<Option<Agent>>;
    fn list_agents(&self, query: &AgentListQuery) -> RepoResult<Vec<Agent>>;
    fn soft_delete_agent(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed agent repository.
pub struct SqliteAgentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAgentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AgentRepository for SqliteAgentRepository<'_> {
    fn create_agent(&self, agent: &Agent) -> RepoResult<RecordId> {
        agent.validate()?;

        self.conn
            .execute(
                "INSERT INTO agents (
                    id,
                    kind,
                    name,
                    slug,
                    instagram,
                    bio,
                    city_id,
                    search_name,
                    is_deleted
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    agent.id.to_string(),
                    agent.kind.as_str(),
                    agent.name.as_str(),
                    agent.slug.as_str(),
                    agent.instagram.as_deref(),
                    agent.bio.as_deref(),
                    agent.city_id.map(|id| id.to_string()),
                    fold_for_search(&agent.name),
                    bool_to_int(agent.is_deleted),
                ],
            )
            .map_err(|err| map_slug_write_error(err, collection_name(agent.kind), &agent.slug))?;

        Ok(agent.id)
    }

    fn update_agent(&self, agent: &Agent) -> RepoResult<()> {
        agent.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE agents
                 SET
                    kind = ?1,
                    name = ?2,
                    slug = ?3,
                    instagram = ?4,
                    bio = ?5,
                    city_id = ?6,
                    search_name = ?7,
                    is_deleted = ?8,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?9;",
                params![
                    agent.kind.as_str(),
                    agent.name.as_str(),
                    agent.slug.as_str(),
                    agent.instagram.as_deref(),
                    agent.bio.as_deref(),
                    agent.city_id.map(|id| id.to_string()),
                    fold_for_search(&agent.name),
                    bool_to_int(agent.is_deleted),
                    agent.id.to_string(),
                ],
            )
            .map_err(|err| map_slug_write_error(err, collection_name(agent.kind), &agent.slug))?;

        if changed == 0 {
            return Err(RepoError::NotFound(agent.id));
        }

        Ok(())
    }

    fn get_agent(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Agent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AGENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_agent_row(row)?));
        }

        Ok(None)
    }

    fn get_agent_by_slug(&self, kind: AgentKind, slug: &str) -> RepoResult<Option<Agent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AGENT_SELECT_SQL} WHERE kind = ?1 AND slug = ?2 AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query(params![kind.as_str(), slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_agent_row(row)?));
        }

        Ok(None)
    }

    fn list_agents(&self, query: &AgentListQuery) -> RepoResult<Vec<Agent>> {
        let mut sql = format!("{AGENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }
        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(city_id) = query.city_id {
            sql.push_str(" AND city_id = ?");
            bind_values.push(Value::Text(city_id.to_string()));
        }

        sql.push_str(" ORDER BY search_name ASC, id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut agents = Vec::new();

        while let Some(row) = rows.next()? {
            agents.push(parse_agent_row(row)?);
        }

        Ok(agents)
    }

    fn soft_delete_agent(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE agents
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn collection_name(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Artist => "artists",
        AgentKind::Organizer => "organizers",
    }
}

fn parse_agent_row(row: &Row<'_>) -> RepoResult<Agent> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let kind = AgentKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid agent kind `{kind_text}` in agents.kind"))
    })?;

    let agent = Agent {
        id: parse_record_id(&id_text, "agents.id")?,
        kind,
        name: row.get("name")?,
        slug: row.get("slug")?,
        instagram: row.get("instagram")?,
        bio: row.get("bio")?,
        city_id: parse_optional_record_id(row.get("city_id")?, "agents.city_id")?,
        is_deleted: parse_bool(row.get("is_deleted")?, "agents.is_deleted")?,
    };
    agent.validate()?;
    Ok(agent)
}
