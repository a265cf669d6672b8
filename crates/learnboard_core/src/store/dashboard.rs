//! Dashboard store: topic tree, project arena and remote mirroring.
//!
//! # Responsibility
//! - Hold the authoritative in-memory topic tree.
//! - Mirror every mutation to the injected document store when one exists.
//! - Keep the flat project index consistent after every action.
//!
//! # Invariants
//! - Validation failures are raised before any remote write or local change.
//! - The remote write happens first; local state changes only after it
//!   succeeds.
//! - After every action the index lists exactly the projects referenced by
//!   topics, and the arena holds no unreferenced project.

use crate::model::note::{Note, NoteId};
use crate::model::project::{Project, ProjectPatch, ProjectStatus};
use crate::model::topic::{topic_fields, topic_id_from_name, Topic, TopicPatch, TopicRecord};
use crate::remote::{
    CollectionPath, DocumentPath, DocumentStore, OrderBy, RemoteError, RemoteResult,
};
use crate::store::codec::{decode_note, decode_project, decode_topic_name, note_fields};
use crate::store::error::{StoreError, StoreResult};
use crate::store::index::ProjectIndex;
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of [`DashboardStore::load_initial_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Topics were already populated; nothing was read.
    AlreadyLoaded,
    /// No remote handle is configured; the tree starts empty.
    LocalOnly,
    /// The tree was loaded from the remote store.
    Remote(LoadCounts),
    /// A remote read failed; the tree was reset to empty.
    FallbackAfterError,
}

/// Number of entities read during a remote load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub topics: usize,
    pub projects: usize,
    pub notes: usize,
}

/// In-memory learning dashboard synchronized with an optional document store.
pub struct DashboardStore {
    remote: Option<Arc<dyn DocumentStore>>,
    topics: Vec<TopicRecord>,
    projects: HashMap<String, Project>,
    index: ProjectIndex,
    using_remote: bool,
}

impl DashboardStore {
    /// Creates an empty store. `None` means local-only operation.
    pub fn new(remote: Option<Arc<dyn DocumentStore>>) -> Self {
        Self {
            remote,
            topics: Vec::new(),
            projects: HashMap::new(),
            index: ProjectIndex::default(),
            using_remote: false,
        }
    }

    /// Creates an empty store mirroring into `remote`.
    pub fn with_remote(remote: Arc<dyn DocumentStore>) -> Self {
        Self::new(Some(remote))
    }

    /// Creates an empty local-only store.
    pub fn local() -> Self {
        Self::new(None)
    }

    /// Loads the full tree from the remote store.
    ///
    /// Never fails: a read error is logged and collapses to an empty tree with
    /// remote use disabled.
    pub async fn load_initial_data(&mut self) -> LoadOutcome {
        if !self.topics.is_empty() {
            return LoadOutcome::AlreadyLoaded;
        }

        let Some(remote) = self.remote.clone() else {
            self.replace_tree(Vec::new());
            self.using_remote = false;
            info!("event=dashboard_load module=store status=ok source=local");
            return LoadOutcome::LocalOnly;
        };

        match fetch_tree(remote.as_ref()).await {
            Ok(topics) => {
                let counts = self.replace_tree(topics);
                self.using_remote = true;
                info!(
                    "event=dashboard_load module=store status=ok source=remote topics={} projects={} notes={}",
                    counts.topics, counts.projects, counts.notes
                );
                LoadOutcome::Remote(counts)
            }
            Err(err) => {
                error!(
                    "event=dashboard_load module=store status=error fallback=empty error={err}"
                );
                self.replace_tree(Vec::new());
                self.using_remote = false;
                LoadOutcome::FallbackAfterError
            }
        }
    }

    /// Rebuilds the project index from the topic records and drops any
    /// arena project no topic references.
    pub fn reindex_projects(&mut self) {
        self.index = ProjectIndex::rebuild(&self.topics);
        let index = &self.index;
        self.projects.retain(|project_id, _| index.contains(project_id));
    }

    /// Writes a whole topic tree to `remote`, one document at a time.
    ///
    /// Local state of any store is untouched; notes are written under their
    /// own IDs.
    ///
    /// The whole tree is checked before the first write: repeated project IDs,
    /// repeated note IDs within a project and IDs that cannot form a document
    /// path are rejected.
    pub async fn seed_remote(remote: &dyn DocumentStore, topics: &[Topic]) -> StoreResult<()> {
        let mut seen_projects = HashSet::new();
        for topic in topics {
            DocumentPath::topic(&topic.id)?;
            for project in &topic.projects {
                if !seen_projects.insert(project.id.as_str()) {
                    return Err(StoreError::DuplicateProject(project.id.clone()));
                }
                ensure_unique_notes(project)?;
                ensure_project_paths(&topic.id, project)?;
            }
        }

        let mut counts = LoadCounts::default();
        for topic in topics {
            let topic_path = DocumentPath::topic(&topic.id)?;
            remote
                .set_document(&topic_path, topic.to_fields())
                .await
                .map_err(|err| remote_failure("dashboard_seed", err))?;
            counts.topics += 1;
            for project in &topic.projects {
                write_project(remote, &topic.id, project)
                    .await
                    .map_err(|err| remote_failure("dashboard_seed", err))?;
                counts.projects += 1;
                counts.notes += project.notes.len();
            }
        }
        info!(
            "event=dashboard_seed module=store status=ok topics={} projects={} notes={}",
            counts.topics, counts.projects, counts.notes
        );
        Ok(())
    }

    /// Creates a topic whose ID is derived from `name`; returns that ID.
    ///
    /// Names whose ID cannot form a document path are only rejected when a
    /// remote store is attached.
    pub async fn create_topic(&mut self, name: &str) -> StoreResult<String> {
        let topic_id = topic_id_from_name(name)
            .ok_or_else(|| StoreError::InvalidTopicName(name.to_string()))?;
        if self.topic(&topic_id).is_some() {
            return Err(StoreError::DuplicateTopic(topic_id));
        }

        if let Some(remote) = &self.remote {
            let topic_path = DocumentPath::topic(&topic_id)
                .map_err(|_| StoreError::InvalidTopicName(name.to_string()))?;
            remote
                .set_document(&topic_path, topic_fields(name))
                .await
                .map_err(|err| remote_failure("topic_create", err))?;
        }

        self.topics.push(TopicRecord::new(topic_id.clone(), name));
        self.reindex_projects();
        info!("event=topic_create module=store status=ok topic_id={topic_id}");
        Ok(topic_id)
    }

    /// Applies a partial update to one topic.
    pub async fn update_topic(&mut self, topic_id: &str, patch: &TopicPatch) -> StoreResult<()> {
        if self.topic(topic_id).is_none() {
            return Err(StoreError::TopicNotFound(topic_id.to_string()));
        }

        if let Some(remote) = &self.remote {
            remote
                .update_document(&DocumentPath::topic(topic_id)?, patch.to_fields())
                .await
                .map_err(|err| remote_failure("topic_update", err))?;
        }

        if let Some(topic) = self.topics.iter_mut().find(|topic| topic.id == topic_id) {
            patch.apply_to(topic);
        }
        self.reindex_projects();
        info!("event=topic_update module=store status=ok topic_id={topic_id}");
        Ok(())
    }

    /// Deletes a topic together with its projects and notes.
    ///
    /// Remote child documents are swept before the topic document. Deleting an
    /// unknown topic is not an error.
    pub async fn delete_topic(&mut self, topic_id: &str) -> StoreResult<()> {
        if let Some(remote) = &self.remote {
            sweep_topic(remote.as_ref(), topic_id)
                .await
                .map_err(|err| remote_failure("topic_delete", err))?;
        }

        self.topics.retain(|topic| topic.id != topic_id);
        self.reindex_projects();
        info!("event=topic_delete module=store status=ok topic_id={topic_id}");
        Ok(())
    }

    /// Adds a project under `topic_id`, creating the topic when it is absent.
    ///
    /// An implicitly created topic uses `topic_id` as its display name.
    pub async fn add_project(&mut self, topic_id: &str, project: Project) -> StoreResult<()> {
        if self.index.contains(&project.id) {
            return Err(StoreError::DuplicateProject(project.id));
        }
        ensure_unique_notes(&project)?;
        let topic_exists = self.topic(topic_id).is_some();

        if let Some(remote) = &self.remote {
            let topic_path = DocumentPath::topic(topic_id)?;
            ensure_project_paths(topic_id, &project)?;
            let result: RemoteResult<()> = async {
                if !topic_exists {
                    remote
                        .set_document(&topic_path, topic_fields(topic_id))
                        .await?;
                }
                write_project(remote.as_ref(), topic_id, &project).await
            }
            .await;
            result.map_err(|err| remote_failure("project_add", err))?;
        }

        let project_id = project.id.clone();
        match self.topics.iter_mut().find(|topic| topic.id == topic_id) {
            Some(topic) => topic.project_ids.push(project_id.clone()),
            None => {
                let mut topic = TopicRecord::new(topic_id, topic_id);
                topic.project_ids.push(project_id.clone());
                self.topics.push(topic);
            }
        }
        self.projects.insert(project_id.clone(), project);
        self.reindex_projects();
        info!(
            "event=project_add module=store status=ok topic_id={topic_id} project_id={project_id}"
        );
        Ok(())
    }

    /// Applies a partial update to one project found through the index.
    pub async fn update_project(
        &mut self,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> StoreResult<()> {
        self.patch_project("project_update", project_id, patch).await
    }

    /// Removes a project from `topic_id`.
    ///
    /// Ownership is resolved through the index, so a stale `topic_id` fails
    /// before anything is deleted.
    pub async fn remove_project(&mut self, topic_id: &str, project_id: &str) -> StoreResult<()> {
        let owner = self
            .index
            .owner_of(project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
        if owner != topic_id {
            return Err(StoreError::ProjectOwnerMismatch {
                project_id: project_id.to_string(),
                expected_topic: topic_id.to_string(),
                actual_topic: owner.to_string(),
            });
        }

        if let Some(remote) = &self.remote {
            sweep_project(remote.as_ref(), topic_id, project_id)
                .await
                .map_err(|err| remote_failure("project_remove", err))?;
        }

        if let Some(topic) = self.topics.iter_mut().find(|topic| topic.id == topic_id) {
            topic.project_ids.retain(|id| id != project_id);
        }
        self.reindex_projects();
        info!(
            "event=project_remove module=store status=ok topic_id={topic_id} project_id={project_id}"
        );
        Ok(())
    }

    /// Sets only the status field of one project.
    pub async fn update_project_status(
        &mut self,
        project_id: &str,
        status: ProjectStatus,
    ) -> StoreResult<()> {
        let patch = ProjectPatch {
            status: Some(status),
            ..ProjectPatch::default()
        };
        self.patch_project("project_status", project_id, &patch).await
    }

    /// Appends a note to a project; returns the note's ID.
    pub async fn add_note(&mut self, project_id: &str, note: Note) -> StoreResult<NoteId> {
        let topic_id = self.owner_of(project_id)?;
        if self
            .project_notes(project_id)
            .iter()
            .any(|existing| existing.id == note.id)
        {
            return Err(StoreError::DuplicateNote {
                project_id: project_id.to_string(),
                note_id: note.id,
            });
        }

        if let Some(remote) = &self.remote {
            let note_path = DocumentPath::note(&topic_id, project_id, &note.id)?;
            remote
                .set_document(&note_path, note_fields(&note))
                .await
                .map_err(|err| remote_failure("note_add", err))?;
        }

        let note_id = note.id.clone();
        if let Some(project) = self.projects.get_mut(project_id) {
            project.notes.push(note);
        }
        self.reindex_projects();
        info!(
            "event=note_add module=store status=ok project_id={project_id} note_id={note_id}"
        );
        Ok(note_id)
    }

    /// Replaces the note at `note_index`, keeping its ID.
    ///
    /// When the remote copy is missing the update stays local and a warning
    /// is logged.
    pub async fn update_note(
        &mut self,
        project_id: &str,
        note_index: usize,
        updated: Note,
    ) -> StoreResult<()> {
        let topic_id = self.owner_of(project_id)?;
        let note_id = self.note_at(project_id, note_index)?.id.clone();
        let replacement = Note::with_id(note_id.clone(), updated.date, updated.content);

        if let Some(remote) = &self.remote {
            let note_path = DocumentPath::note(&topic_id, project_id, &note_id)?;
            match remote
                .update_document(&note_path, note_fields(&replacement))
                .await
            {
                Ok(()) => {}
                Err(RemoteError::NotFound(path)) => warn!(
                    "event=note_update module=store status=warn reason=remote_missing path={path} sync=local_only"
                ),
                Err(err) => return Err(remote_failure("note_update", err)),
            }
        }

        if let Some(slot) = self
            .projects
            .get_mut(project_id)
            .and_then(|project| project.notes.get_mut(note_index))
        {
            *slot = replacement;
        }
        self.reindex_projects();
        info!(
            "event=note_update module=store status=ok project_id={project_id} note_id={note_id}"
        );
        Ok(())
    }

    /// Deletes the note at `note_index`.
    ///
    /// When the remote copy is missing the delete stays local and a warning
    /// is logged.
    pub async fn delete_note(&mut self, project_id: &str, note_index: usize) -> StoreResult<()> {
        let topic_id = self.owner_of(project_id)?;
        let note_id = self.note_at(project_id, note_index)?.id.clone();

        if let Some(remote) = &self.remote {
            let note_path = DocumentPath::note(&topic_id, project_id, &note_id)?;
            let result: RemoteResult<bool> = async {
                match remote.get_document(&note_path).await? {
                    Some(_) => remote.delete_document(&note_path).await.map(|()| true),
                    None => Ok(false),
                }
            }
            .await;
            match result {
                Ok(true) => {}
                Ok(false) => warn!(
                    "event=note_delete module=store status=warn reason=remote_missing path={note_path} sync=local_only"
                ),
                Err(err) => return Err(remote_failure("note_delete", err)),
            }
        }

        if let Some(project) = self.projects.get_mut(project_id) {
            project.notes.remove(note_index);
        }
        self.reindex_projects();
        info!(
            "event=note_delete module=store status=ok project_id={project_id} note_id={note_id}"
        );
        Ok(())
    }

    /// Whether the last load read from the remote store.
    pub fn is_using_remote(&self) -> bool {
        self.using_remote
    }

    pub fn topics(&self) -> &[TopicRecord] {
        &self.topics
    }

    pub fn topic(&self, topic_id: &str) -> Option<&TopicRecord> {
        self.topics.iter().find(|topic| topic.id == topic_id)
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        if !self.index.contains(project_id) {
            return None;
        }
        self.projects.get(project_id)
    }

    /// Owning topic ID of a project.
    pub fn project_topic_id(&self, project_id: &str) -> Option<&str> {
        self.index.owner_of(project_id)
    }

    /// Projects of one topic in insertion order; empty when the topic is absent.
    pub fn topic_projects(&self, topic_id: &str) -> Vec<&Project> {
        self.topic(topic_id)
            .map(|topic| {
                topic
                    .project_ids
                    .iter()
                    .filter_map(|id| self.projects.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Notes of one project; empty when the project is absent.
    pub fn project_notes(&self, project_id: &str) -> &[Note] {
        self.project(project_id)
            .map(|project| project.notes.as_slice())
            .unwrap_or(&[])
    }

    /// `(completed, total)` project counts for a topic.
    pub fn topic_progress(&self, topic_id: &str) -> (usize, usize) {
        let projects = self.topic_projects(topic_id);
        let completed = projects
            .iter()
            .filter(|project| project.is_completed())
            .count();
        (completed, projects.len())
    }

    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }

    /// Owned nested snapshot of the whole tree in topic order.
    pub fn tree(&self) -> Vec<Topic> {
        self.topics
            .iter()
            .map(|topic| Topic {
                id: topic.id.clone(),
                name: topic.name.clone(),
                projects: self
                    .topic_projects(&topic.id)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    async fn patch_project(
        &mut self,
        event: &'static str,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> StoreResult<()> {
        let topic_id = self.owner_of(project_id)?;

        if let Some(remote) = &self.remote {
            remote
                .update_document(
                    &DocumentPath::project(&topic_id, project_id)?,
                    patch.to_fields(),
                )
                .await
                .map_err(|err| remote_failure(event, err))?;
        }

        if let Some(project) = self.projects.get_mut(project_id) {
            patch.apply_to(project);
        }
        self.reindex_projects();
        info!("event={event} module=store status=ok project_id={project_id}");
        Ok(())
    }

    fn owner_of(&self, project_id: &str) -> StoreResult<String> {
        self.index
            .owner_of(project_id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))
    }

    fn note_at(&self, project_id: &str, note_index: usize) -> StoreResult<&Note> {
        let notes = self.project_notes(project_id);
        notes
            .get(note_index)
            .ok_or_else(|| StoreError::NoteIndexOutOfRange {
                project_id: project_id.to_string(),
                index: note_index,
                len: notes.len(),
            })
    }

    /// Swaps in a freshly loaded tree and rebuilds the index.
    ///
    /// Projects whose ID was already seen in an earlier topic are skipped.
    fn replace_tree(&mut self, topics: Vec<Topic>) -> LoadCounts {
        let mut counts = LoadCounts::default();
        self.topics.clear();
        self.projects.clear();
        for topic in topics {
            let mut record = TopicRecord::new(topic.id, topic.name);
            for project in topic.projects {
                if self.projects.contains_key(&project.id) {
                    warn!(
                        "event=dashboard_load module=store status=warn reason=duplicate_project project_id={} topic_id={}",
                        project.id, record.id
                    );
                    continue;
                }
                counts.projects += 1;
                counts.notes += project.notes.len();
                record.project_ids.push(project.id.clone());
                self.projects.insert(project.id.clone(), project);
            }
            counts.topics += 1;
            self.topics.push(record);
        }
        self.reindex_projects();
        counts
    }
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::local()
    }
}

fn remote_failure(event: &'static str, err: RemoteError) -> StoreError {
    error!("event={event} module=store status=error error_code=remote_failed error={err}");
    StoreError::Remote(err)
}

/// Reads topics, then each topic's projects by `startDate` desc, then each
/// project's notes by `date` desc.
async fn fetch_tree(remote: &dyn DocumentStore) -> RemoteResult<Vec<Topic>> {
    let by_start_date = OrderBy::desc("startDate");
    let by_date = OrderBy::desc("date");

    let mut topics = Vec::new();
    for topic_doc in remote
        .list_documents(&CollectionPath::topics(), None)
        .await?
    {
        let project_docs = remote
            .list_documents(&CollectionPath::projects(&topic_doc.id)?, Some(&by_start_date))
            .await?;
        let mut projects = Vec::with_capacity(project_docs.len());
        for project_doc in project_docs {
            let notes = remote
                .list_documents(
                    &CollectionPath::notes(&topic_doc.id, &project_doc.id)?,
                    Some(&by_date),
                )
                .await?
                .iter()
                .map(decode_note)
                .collect();
            projects.push(decode_project(&project_doc, notes));
        }
        topics.push(Topic {
            name: decode_topic_name(&topic_doc),
            id: topic_doc.id,
            projects,
        });
    }
    Ok(topics)
}

fn ensure_unique_notes(project: &Project) -> StoreResult<()> {
    let mut seen = HashSet::new();
    for note in &project.notes {
        if !seen.insert(note.id.as_str()) {
            return Err(StoreError::DuplicateNote {
                project_id: project.id.clone(),
                note_id: note.id.clone(),
            });
        }
    }
    Ok(())
}

/// Checks that the project and every note of it map to document paths.
fn ensure_project_paths(topic_id: &str, project: &Project) -> StoreResult<()> {
    DocumentPath::project(topic_id, &project.id)?;
    for note in &project.notes {
        DocumentPath::note(topic_id, &project.id, &note.id)?;
    }
    Ok(())
}

async fn write_project(
    remote: &dyn DocumentStore,
    topic_id: &str,
    project: &Project,
) -> RemoteResult<()> {
    remote
        .set_document(&DocumentPath::project(topic_id, &project.id)?, project.to_fields())
        .await?;
    for note in &project.notes {
        remote
            .set_document(
                &DocumentPath::note(topic_id, &project.id, &note.id)?,
                note_fields(note),
            )
            .await?;
    }
    Ok(())
}

async fn sweep_project(
    remote: &dyn DocumentStore,
    topic_id: &str,
    project_id: &str,
) -> RemoteResult<()> {
    let project_path = DocumentPath::project(topic_id, project_id)?;
    let notes = project_path.collection("notes");
    for note in remote.list_documents(&notes, None).await? {
        remote.delete_document(&notes.doc(&note.id)?).await?;
    }
    remote.delete_document(&project_path).await
}

async fn sweep_topic(remote: &dyn DocumentStore, topic_id: &str) -> RemoteResult<()> {
    let topic_path = DocumentPath::topic(topic_id)?;
    for project in remote
        .list_documents(&topic_path.collection("projects"), None)
        .await?
    {
        sweep_project(remote, topic_id, &project.id).await?;
    }
    remote.delete_document(&topic_path).await
}
