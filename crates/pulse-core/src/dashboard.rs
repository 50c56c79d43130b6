use crate::ai::{AiFacade, Insight};
use crate::analytics::{rank_gaps, rank_sponsors, summarize_gaps, DashboardStats, GapSummary};
use crate::backend::{row_id, Backend, Row};
use crate::config::Config;
use crate::error::{BackendError, MutationError};
use crate::filter::{filter_events, filter_sponsors};
use crate::mapper::fields::{field, text};
use crate::mapper::rows::{
    activity_row, association_rows, event_patch, event_row, market_gap_patch, market_gap_row,
    my_event_patch, my_event_row, sponsor_patch, sponsor_row, task_patch, task_row,
};
use crate::mapper::{index_sponsorships, map_event, map_market_gap, map_my_event, map_sponsor, map_task};
use crate::snapshot::Snapshot;
use crate::sync::SyncController;
use crate::types::{
    Activity, ActivityType, CreateEventInput, CreateMarketGapInput, CreateMyEventInput,
    CreateSponsorInput, CreateTaskInput, EntityType, Event, EventAnalysisReport, EventFilter,
    EventId, MarketGap, MarketGapId, MyEvent, MyEventId, ProfileId, Sponsor, SponsorAssociation,
    SponsorFilter, SponsorId, SponsorMatch, SponsorshipStrategy, Task, TaskId, UpdateEventInput,
    UpdateMarketGapInput, UpdateMyEventInput, UpdateSponsorInput, UpdateTaskInput,
};
use crate::validation::{
    validate_create_event, validate_create_market_gap, validate_create_my_event,
    validate_create_sponsor, validate_create_task, validate_update_event,
    validate_update_market_gap, validate_update_my_event, validate_update_sponsor,
    validate_update_task,
};
use chrono::NaiveDate;
use pulse_events::Collection;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub actor_id: Option<ProfileId>,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(actor_id: Option<ProfileId>, correlation_id: Option<String>) -> Self {
        Self {
            actor_id,
            correlation_id,
        }
    }
}

/// Entry point for views: read accessors over the current snapshot and
/// mutations that write through, record activity, then refresh.
pub struct Dashboard {
    sync: Arc<SyncController>,
    ai: AiFacade,
}

impl Dashboard {
    pub fn new(sync: Arc<SyncController>, ai: AiFacade) -> Self {
        Self { sync, ai }
    }

    pub fn from_config(config: &Config, remote: Option<Arc<dyn Backend>>) -> Self {
        Self::new(SyncController::new(remote), AiFacade::from_config(&config.ai))
    }

    pub fn sync(&self) -> &Arc<SyncController> {
        &self.sync
    }

    pub fn ai(&self) -> &AiFacade {
        &self.ai
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.sync.snapshot()
    }

    pub fn events(&self) -> EventsApi<'_> {
        EventsApi { core: self }
    }

    pub fn sponsors(&self) -> SponsorsApi<'_> {
        SponsorsApi { core: self }
    }

    pub fn drafts(&self) -> DraftsApi<'_> {
        DraftsApi { core: self }
    }

    pub fn gaps(&self) -> GapsApi<'_> {
        GapsApi { core: self }
    }

    pub fn tasks(&self) -> TasksApi<'_> {
        TasksApi { core: self }
    }

    pub fn activity(&self) -> ActivityApi<'_> {
        ActivityApi { core: self }
    }

    pub fn analytics(&self) -> AnalyticsApi<'_> {
        AnalyticsApi { core: self }
    }

    pub fn insights(&self) -> InsightsApi<'_> {
        InsightsApi { core: self }
    }

    fn backend(&self) -> Arc<dyn Backend> {
        self.sync.write_target()
    }

    /// Runs after a successful remote write: appends the audit entry and
    /// refreshes. A failed append is logged and does not undo the write.
    async fn commit(
        &self,
        ctx: &RequestContext,
        activity_type: ActivityType,
        entity_type: EntityType,
        entity_name: &str,
    ) -> Arc<Snapshot> {
        let row = activity_row(activity_type, entity_type, entity_name, ctx.actor_id.as_ref());
        if let Err(err) = self.backend().insert(Collection::Activities, row).await {
            warn!(
                error = %err,
                entity = %entity_type,
                action = %activity_type,
                "activity append failed"
            );
        }
        info!(
            entity = %entity_type,
            action = %activity_type,
            name = entity_name,
            correlation_id = ?ctx.correlation_id,
            "mutation committed"
        );
        self.sync.refresh().await
    }
}

fn missing(entity: EntityType, id: &str) -> impl FnOnce(BackendError) -> MutationError + '_ {
    move |err| match err {
        BackendError::NotFound { .. } => MutationError::NotFound {
            entity,
            id: id.to_string(),
        },
        other => MutationError::Remote(other),
    }
}

fn inserted_id(row: &Row) -> Result<String, MutationError> {
    row_id(row).map(str::to_string).ok_or_else(|| {
        MutationError::Remote(BackendError::Rejected {
            message: "backend returned a row without an id".to_string(),
        })
    })
}

fn label(row: &Row, key: &str, fallback: &str) -> String {
    let value = text(field(row, key));
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn remote_failure(entity: EntityType, action: ActivityType, err: &MutationError) {
    warn!(entity = %entity, action = %action, error = %err, "mutation aborted");
}

pub struct EventsApi<'a> {
    core: &'a Dashboard,
}

impl EventsApi<'_> {
    pub fn list(&self) -> Vec<Event> {
        self.core.snapshot().events.clone()
    }

    pub fn get(&self, id: &EventId) -> Option<Event> {
        self.core.snapshot().event(id).cloned()
    }

    pub fn filter(&self, filter: &EventFilter) -> Vec<Event> {
        filter_events(&self.core.snapshot().events, filter)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateEventInput,
    ) -> Result<Event, MutationError> {
        validate_create_event(&input)?;
        let stored = self
            .write_create(&input, ctx)
            .await
            .inspect_err(|err| remote_failure(EntityType::Event, ActivityType::Create, err))?;
        let id = EventId::new(inserted_id(&stored)?);
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Create, EntityType::Event, input.name.trim())
            .await;
        Ok(snapshot
            .event(&id)
            .cloned()
            .unwrap_or_else(|| map_event(&stored, id, input.sponsors)))
    }

    async fn write_create(
        &self,
        input: &CreateEventInput,
        ctx: &RequestContext,
    ) -> Result<Row, MutationError> {
        let backend = self.core.backend();
        let stored = backend
            .insert(Collection::Events, event_row(input, ctx.actor_id.as_ref()))
            .await?;
        let id = EventId::new(inserted_id(&stored)?);
        let mut changes = AssociationChanges::default();
        if let Err(err) =
            insert_associations(backend.as_ref(), &id, &input.sponsors, &mut changes).await
        {
            changes.undo(backend.as_ref()).await;
            if let Err(cleanup) = backend.delete(Collection::Events, id.as_str()).await {
                warn!(error = %cleanup, id = %id, "event rollback failed");
            }
            return Err(err.into());
        }
        Ok(stored)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &EventId,
        input: UpdateEventInput,
    ) -> Result<Event, MutationError> {
        validate_update_event(&input)?;
        let backend = self.core.backend();
        // Swap before patching: a failed swap leaves the event row untouched.
        let swapped = match &input.sponsors {
            Some(sponsors) => Some(
                replace_associations(backend.as_ref(), id, sponsors)
                    .await
                    .inspect_err(|err| {
                        remote_failure(EntityType::Event, ActivityType::Update, err);
                    })?,
            ),
            None => None,
        };
        let stored = match backend
            .update(Collection::Events, id.as_str(), event_patch(&input))
            .await
        {
            Ok(stored) => stored,
            Err(err) => {
                if let Some(changes) = swapped {
                    changes.undo(backend.as_ref()).await;
                }
                let err = missing(EntityType::Event, id.as_str())(err);
                remote_failure(EntityType::Event, ActivityType::Update, &err);
                return Err(err);
            }
        };
        let name = label(&stored, "name", id.as_str());
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Update, EntityType::Event, &name)
            .await;
        Ok(snapshot.event(id).cloned().unwrap_or_else(|| {
            map_event(&stored, id.clone(), input.sponsors.unwrap_or_default())
        }))
    }

    /// Association rows naming the event are left for the backend to clean
    /// up; the mapper ignores rows whose event is gone.
    pub async fn delete(&self, ctx: &RequestContext, id: &EventId) -> Result<(), MutationError> {
        let name = self
            .core
            .snapshot()
            .event(id)
            .map_or_else(|| id.to_string(), |event| event.name.clone());
        self.core
            .backend()
            .delete(Collection::Events, id.as_str())
            .await
            .map_err(missing(EntityType::Event, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::Event, ActivityType::Delete, err))?;
        self.core
            .commit(ctx, ActivityType::Delete, EntityType::Event, &name)
            .await;
        Ok(())
    }
}

/// Association rows written or removed by one mutation, kept so a failed
/// mutation can put them back.
#[derive(Debug, Default)]
struct AssociationChanges {
    added: Vec<String>,
    removed: Vec<Row>,
}

impl AssociationChanges {
    /// Best effort: a failed step is logged and the rest still run.
    async fn undo(self, backend: &dyn Backend) {
        for id in &self.added {
            if let Err(err) = backend.delete(Collection::EventSponsors, id).await {
                warn!(error = %err, id = %id, "association rollback failed");
            }
        }
        for row in self.removed {
            if let Err(err) = backend.insert(Collection::EventSponsors, row).await {
                warn!(error = %err, "association restore failed");
            }
        }
    }
}

async fn insert_associations(
    backend: &dyn Backend,
    event_id: &EventId,
    associations: &[SponsorAssociation],
    changes: &mut AssociationChanges,
) -> Result<(), BackendError> {
    for row in association_rows(event_id, associations) {
        let stored = backend.insert(Collection::EventSponsors, row).await?;
        if let Some(id) = row_id(&stored) {
            changes.added.push(id.to_string());
        }
    }
    Ok(())
}

/// Replaces every association of `event_id` with `associations`. On failure
/// the rows already touched are restored before the error is returned.
async fn replace_associations(
    backend: &dyn Backend,
    event_id: &EventId,
    associations: &[SponsorAssociation],
) -> Result<AssociationChanges, MutationError> {
    let events = backend.select_all(Collection::Events).await?;
    if !events.iter().any(|row| row_id(row) == Some(event_id.as_str())) {
        return Err(MutationError::NotFound {
            entity: EntityType::Event,
            id: event_id.to_string(),
        });
    }
    let mut changes = AssociationChanges::default();
    match swap_associations(backend, event_id, associations, &mut changes).await {
        Ok(()) => Ok(changes),
        Err(err) => {
            changes.undo(backend).await;
            Err(err.into())
        }
    }
}

/// New rows go in before old rows come out, so an event never loses its
/// sponsors to a half-finished swap.
async fn swap_associations(
    backend: &dyn Backend,
    event_id: &EventId,
    associations: &[SponsorAssociation],
    changes: &mut AssociationChanges,
) -> Result<(), BackendError> {
    let existing: Vec<Row> = backend
        .select_all(Collection::EventSponsors)
        .await?
        .into_iter()
        .filter(|row| field(row, "event_id").as_str() == Some(event_id.as_str()))
        .collect();
    insert_associations(backend, event_id, associations, changes).await?;
    for row in existing {
        let Some(id) = row_id(&row).map(str::to_string) else {
            continue;
        };
        backend.delete(Collection::EventSponsors, &id).await?;
        changes.removed.push(row);
    }
    Ok(())
}

pub struct SponsorsApi<'a> {
    core: &'a Dashboard,
}

impl SponsorsApi<'_> {
    pub fn list(&self) -> Vec<Sponsor> {
        self.core.snapshot().sponsors.clone()
    }

    pub fn get(&self, id: &SponsorId) -> Option<Sponsor> {
        self.core.snapshot().sponsor(id).cloned()
    }

    pub fn filter(&self, filter: &SponsorFilter) -> Vec<Sponsor> {
        filter_sponsors(&self.core.snapshot().sponsors, filter)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateSponsorInput,
    ) -> Result<Sponsor, MutationError> {
        validate_create_sponsor(&input)?;
        let stored = self
            .core
            .backend()
            .insert(Collection::Sponsors, sponsor_row(&input))
            .await
            .map_err(MutationError::from)
            .inspect_err(|err| remote_failure(EntityType::Sponsor, ActivityType::Create, err))?;
        let id = SponsorId::new(inserted_id(&stored)?);
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Create, EntityType::Sponsor, input.name.trim())
            .await;
        Ok(mapped_sponsor(&snapshot, &stored, id))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &SponsorId,
        input: UpdateSponsorInput,
    ) -> Result<Sponsor, MutationError> {
        validate_update_sponsor(&input)?;
        let stored = self
            .core
            .backend()
            .update(Collection::Sponsors, id.as_str(), sponsor_patch(&input))
            .await
            .map_err(missing(EntityType::Sponsor, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::Sponsor, ActivityType::Update, err))?;
        let name = label(&stored, "name", id.as_str());
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Update, EntityType::Sponsor, &name)
            .await;
        Ok(mapped_sponsor(&snapshot, &stored, id.clone()))
    }

    /// Events may keep referencing the deleted sponsor; those associations
    /// stop resolving on the next load.
    pub async fn delete(&self, ctx: &RequestContext, id: &SponsorId) -> Result<(), MutationError> {
        let name = self
            .core
            .snapshot()
            .sponsor(id)
            .map_or_else(|| id.to_string(), |sponsor| sponsor.name.clone());
        self.core
            .backend()
            .delete(Collection::Sponsors, id.as_str())
            .await
            .map_err(missing(EntityType::Sponsor, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::Sponsor, ActivityType::Delete, err))?;
        self.core
            .commit(ctx, ActivityType::Delete, EntityType::Sponsor, &name)
            .await;
        Ok(())
    }
}

fn mapped_sponsor(snapshot: &Snapshot, stored: &Row, id: SponsorId) -> Sponsor {
    if let Some(sponsor) = snapshot.sponsor(&id) {
        return sponsor.clone();
    }
    map_sponsor(stored, id, &index_sponsorships(&snapshot.events))
}

pub struct DraftsApi<'a> {
    core: &'a Dashboard,
}

impl DraftsApi<'_> {
    pub fn list(&self) -> Vec<MyEvent> {
        self.core.snapshot().my_events.clone()
    }

    pub fn get(&self, id: &MyEventId) -> Option<MyEvent> {
        self.core.snapshot().my_event(id).cloned()
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateMyEventInput,
    ) -> Result<MyEvent, MutationError> {
        validate_create_my_event(&input)?;
        let stored = self
            .core
            .backend()
            .insert(
                Collection::MyEvents,
                my_event_row(&input, ctx.actor_id.as_ref()),
            )
            .await
            .map_err(MutationError::from)
            .inspect_err(|err| remote_failure(EntityType::MyEvent, ActivityType::Create, err))?;
        let id = MyEventId::new(inserted_id(&stored)?);
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Create, EntityType::MyEvent, input.name.trim())
            .await;
        snapshot
            .my_event(&id)
            .cloned()
            .or_else(|| map_my_event(&stored))
            .ok_or_else(|| unmappable(EntityType::MyEvent, &id))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &MyEventId,
        input: UpdateMyEventInput,
    ) -> Result<MyEvent, MutationError> {
        validate_update_my_event(&input)?;
        let stored = self
            .core
            .backend()
            .update(Collection::MyEvents, id.as_str(), my_event_patch(&input))
            .await
            .map_err(missing(EntityType::MyEvent, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::MyEvent, ActivityType::Update, err))?;
        let name = label(&stored, "name", id.as_str());
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Update, EntityType::MyEvent, &name)
            .await;
        snapshot
            .my_event(id)
            .cloned()
            .or_else(|| map_my_event(&stored))
            .ok_or_else(|| unmappable(EntityType::MyEvent, id))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &MyEventId) -> Result<(), MutationError> {
        let name = self
            .core
            .snapshot()
            .my_event(id)
            .map_or_else(|| id.to_string(), |draft| draft.name.clone());
        self.core
            .backend()
            .delete(Collection::MyEvents, id.as_str())
            .await
            .map_err(missing(EntityType::MyEvent, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::MyEvent, ActivityType::Delete, err))?;
        self.core
            .commit(ctx, ActivityType::Delete, EntityType::MyEvent, &name)
            .await;
        Ok(())
    }
}

fn unmappable(entity: EntityType, id: &impl std::fmt::Display) -> MutationError {
    MutationError::Remote(BackendError::Rejected {
        message: format!("stored {entity} {id} could not be read back"),
    })
}

pub struct GapsApi<'a> {
    core: &'a Dashboard,
}

impl GapsApi<'_> {
    pub fn list(&self) -> Vec<MarketGap> {
        self.core.snapshot().market_gaps.clone()
    }

    pub fn get(&self, id: &MarketGapId) -> Option<MarketGap> {
        self.core.snapshot().market_gap(id).cloned()
    }

    /// Severity x opportunity, highest first.
    pub fn ranked(&self) -> Vec<MarketGap> {
        rank_gaps(&self.core.snapshot().market_gaps)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> GapSummary {
        summarize_gaps(&self.core.snapshot().market_gaps)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateMarketGapInput,
    ) -> Result<MarketGap, MutationError> {
        validate_create_market_gap(&input)?;
        let stored = self
            .core
            .backend()
            .insert(Collection::MarketGaps, market_gap_row(&input))
            .await
            .map_err(MutationError::from)
            .inspect_err(|err| remote_failure(EntityType::MarketGap, ActivityType::Create, err))?;
        let id = MarketGapId::new(inserted_id(&stored)?);
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Create, EntityType::MarketGap, input.title.trim())
            .await;
        snapshot
            .market_gap(&id)
            .cloned()
            .or_else(|| map_market_gap(&stored))
            .ok_or_else(|| unmappable(EntityType::MarketGap, &id))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &MarketGapId,
        input: UpdateMarketGapInput,
    ) -> Result<MarketGap, MutationError> {
        validate_update_market_gap(&input)?;
        let stored = self
            .core
            .backend()
            .update(Collection::MarketGaps, id.as_str(), market_gap_patch(&input))
            .await
            .map_err(missing(EntityType::MarketGap, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::MarketGap, ActivityType::Update, err))?;
        let title = label(&stored, "title", id.as_str());
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Update, EntityType::MarketGap, &title)
            .await;
        snapshot
            .market_gap(id)
            .cloned()
            .or_else(|| map_market_gap(&stored))
            .ok_or_else(|| unmappable(EntityType::MarketGap, id))
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: &MarketGapId,
    ) -> Result<(), MutationError> {
        let title = self
            .core
            .snapshot()
            .market_gap(id)
            .map_or_else(|| id.to_string(), |gap| gap.title.clone());
        self.core
            .backend()
            .delete(Collection::MarketGaps, id.as_str())
            .await
            .map_err(missing(EntityType::MarketGap, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::MarketGap, ActivityType::Delete, err))?;
        self.core
            .commit(ctx, ActivityType::Delete, EntityType::MarketGap, &title)
            .await;
        Ok(())
    }
}

pub struct TasksApi<'a> {
    core: &'a Dashboard,
}

impl TasksApi<'_> {
    pub fn list(&self) -> Vec<Task> {
        self.core.snapshot().tasks.clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.core.snapshot().task(id).cloned()
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<Task> {
        self.core
            .snapshot()
            .tasks
            .iter()
            .filter(|task| task.is_overdue(today))
            .cloned()
            .collect()
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateTaskInput,
    ) -> Result<Task, MutationError> {
        validate_create_task(&input)?;
        let stored = self
            .core
            .backend()
            .insert(Collection::Tasks, task_row(&input, ctx.actor_id.as_ref()))
            .await
            .map_err(MutationError::from)
            .inspect_err(|err| remote_failure(EntityType::Task, ActivityType::Create, err))?;
        let id = TaskId::new(inserted_id(&stored)?);
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Create, EntityType::Task, input.title.trim())
            .await;
        snapshot
            .task(&id)
            .cloned()
            .or_else(|| map_task(&stored))
            .ok_or_else(|| unmappable(EntityType::Task, &id))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &TaskId,
        input: UpdateTaskInput,
    ) -> Result<Task, MutationError> {
        validate_update_task(&input)?;
        let stored = self
            .core
            .backend()
            .update(Collection::Tasks, id.as_str(), task_patch(&input))
            .await
            .map_err(missing(EntityType::Task, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::Task, ActivityType::Update, err))?;
        let title = label(&stored, "title", id.as_str());
        let snapshot = self
            .core
            .commit(ctx, ActivityType::Update, EntityType::Task, &title)
            .await;
        snapshot
            .task(id)
            .cloned()
            .or_else(|| map_task(&stored))
            .ok_or_else(|| unmappable(EntityType::Task, id))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &TaskId) -> Result<(), MutationError> {
        let title = self
            .core
            .snapshot()
            .task(id)
            .map_or_else(|| id.to_string(), |task| task.title.clone());
        self.core
            .backend()
            .delete(Collection::Tasks, id.as_str())
            .await
            .map_err(missing(EntityType::Task, id.as_str()))
            .inspect_err(|err| remote_failure(EntityType::Task, ActivityType::Delete, err))?;
        self.core
            .commit(ctx, ActivityType::Delete, EntityType::Task, &title)
            .await;
        Ok(())
    }
}

pub struct ActivityApi<'a> {
    core: &'a Dashboard,
}

impl ActivityApi<'_> {
    /// Newest first, capped at the retention limit.
    pub fn recent(&self) -> Vec<Activity> {
        self.core.snapshot().activities.clone()
    }
}

pub struct AnalyticsApi<'a> {
    core: &'a Dashboard,
}

impl AnalyticsApi<'_> {
    /// Recomputed from the current snapshot on every call.
    pub fn stats(&self, today: NaiveDate) -> DashboardStats {
        DashboardStats::compute(&self.core.snapshot(), today)
    }

    pub fn rank_sponsors(&self, event_id: &EventId) -> Option<Vec<SponsorMatch>> {
        let snapshot = self.core.snapshot();
        let event = snapshot.event(event_id)?;
        Some(rank_sponsors(event, &snapshot.sponsors))
    }
}

pub struct InsightsApi<'a> {
    core: &'a Dashboard,
}

impl InsightsApi<'_> {
    /// Generates an analysis (or its fallback) and stores the rendered
    /// report on the event.
    pub async fn analyze_event(
        &self,
        ctx: &RequestContext,
        id: &EventId,
    ) -> Result<Insight<EventAnalysisReport>, MutationError> {
        let snapshot = self.core.snapshot();
        let event = snapshot.event(id).ok_or_else(|| MutationError::NotFound {
            entity: EntityType::Event,
            id: id.to_string(),
        })?;
        let insight = self.core.ai.analyze_event_or_fallback(&snapshot, event).await;
        self.core
            .events()
            .update(
                ctx,
                id,
                UpdateEventInput {
                    report: Some(insight.value.render()),
                    ..UpdateEventInput::default()
                },
            )
            .await?;
        Ok(insight)
    }

    /// Generates a strategy (or its fallback) and stores it on the draft.
    pub async fn recommend(
        &self,
        ctx: &RequestContext,
        id: &MyEventId,
    ) -> Result<Insight<SponsorshipStrategy>, MutationError> {
        let snapshot = self.core.snapshot();
        let draft = snapshot.my_event(id).ok_or_else(|| MutationError::NotFound {
            entity: EntityType::MyEvent,
            id: id.to_string(),
        })?;
        let insight = self.core.ai.strategy_or_fallback(&snapshot, draft).await;
        self.core
            .drafts()
            .update(
                ctx,
                id,
                UpdateMyEventInput {
                    recommendations: Some(insight.value.clone()),
                    ..UpdateMyEventInput::default()
                },
            )
            .await?;
        Ok(insight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::facade::tests::ScriptedService;
    use crate::backend::MemoryBackend;
    use crate::error::AiError;
    use crate::fixtures::FixtureDataset;
    use crate::types::{
        BudgetRange, EventCategory, GapType, InsightOrigin, SponsorTier, TaskStatus,
    };
    use async_trait::async_trait;
    use pulse_events::ChangeSubscription;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn offline() -> Dashboard {
        let dashboard = Dashboard::new(SyncController::new(None), AiFacade::default());
        dashboard.sync().initialize().await;
        dashboard
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Some(ProfileId::new("usr_andi")), None)
    }

    fn association(id: &str, tier: SponsorTier, amount: f64) -> SponsorAssociation {
        SponsorAssociation {
            sponsor_id: SponsorId::new(id),
            tier,
            deal_amount: amount,
            deliverables: "Stage branding".to_string(),
        }
    }

    /// Reads succeed, writes to `rejected` fail. `one_shot` fails only the
    /// nth (zero-based) write to its collection.
    struct RejectingWrites {
        inner: MemoryBackend,
        rejected: Vec<Collection>,
        one_shot: Option<(Collection, AtomicUsize)>,
    }

    impl RejectingWrites {
        fn check(&self, collection: Collection) -> Result<(), BackendError> {
            if self.rejected.contains(&collection) {
                return Err(BackendError::unavailable("connection reset"));
            }
            if let Some((target, remaining)) = &self.one_shot {
                if *target == collection && remaining.fetch_sub(1, Ordering::SeqCst) == 0 {
                    return Err(BackendError::unavailable("write timed out"));
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Backend for RejectingWrites {
        async fn select_all(&self, collection: Collection) -> Result<Vec<Row>, BackendError> {
            self.inner.select_all(collection).await
        }

        async fn insert(&self, collection: Collection, row: Row) -> Result<Row, BackendError> {
            self.check(collection)?;
            self.inner.insert(collection, row).await
        }

        async fn update(
            &self,
            collection: Collection,
            id: &str,
            patch: Row,
        ) -> Result<Row, BackendError> {
            self.check(collection)?;
            self.inner.update(collection, id, patch).await
        }

        async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
            self.check(collection)?;
            self.inner.delete(collection, id).await
        }

        fn changes(&self, collections: &[Collection]) -> ChangeSubscription {
            self.inner.changes(collections)
        }
    }

    async fn remote(rejected: Vec<Collection>) -> (Dashboard, Arc<RejectingWrites>) {
        remote_with(rejected, None).await
    }

    async fn remote_with(
        rejected: Vec<Collection>,
        one_shot: Option<(Collection, usize)>,
    ) -> (Dashboard, Arc<RejectingWrites>) {
        let backend = Arc::new(RejectingWrites {
            inner: MemoryBackend::seeded(FixtureDataset::bundled()),
            rejected,
            one_shot: one_shot.map(|(collection, n)| (collection, AtomicUsize::new(n))),
        });
        let dashboard = Dashboard::new(
            SyncController::new(Some(backend.clone() as Arc<dyn Backend>)),
            AiFacade::default(),
        );
        dashboard.sync().initialize().await;
        (dashboard, backend)
    }

    #[tokio::test]
    async fn created_event_is_searchable_and_back_referenced() {
        let dashboard = offline().await;
        assert!(dashboard.snapshot().is_degraded());

        let event = dashboard
            .events()
            .create(
                &ctx(),
                CreateEventInput {
                    name: "Lombok Surf Classic".to_string(),
                    organizer: "Rinjani Sports".to_string(),
                    category: EventCategory::Sports,
                    budget: BudgetRange {
                        min: 1_000_000.0,
                        max: 5_000_000.0,
                        ..BudgetRange::default()
                    },
                    sponsors: vec![
                        association("spn_nusantara-telco", SponsorTier::Title, 750_000.0),
                        association("spn_kopi-kita", SponsorTier::Silver, 120_000.0),
                    ],
                    ..CreateEventInput::default()
                },
            )
            .await
            .unwrap();

        let found = dashboard.events().filter(&EventFilter {
            search_query: Some("lombok surf".to_string()),
            ..EventFilter::default()
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, event.id);
        assert_eq!(found[0].sponsors.len(), 2);
        assert!((found[0].budget.min - 1_000_000.0).abs() < f64::EPSILON);

        for sponsor_id in ["spn_nusantara-telco", "spn_kopi-kita"] {
            let sponsor = dashboard.sponsors().get(&SponsorId::new(sponsor_id)).unwrap();
            assert!(sponsor.events_sponsored.contains(&event.id));
        }
    }

    #[tokio::test]
    async fn mutations_append_activity_in_order() {
        let dashboard = offline().await;
        let before = dashboard.activity().recent().len();

        let task = dashboard
            .tasks()
            .create(
                &ctx(),
                CreateTaskInput {
                    title: "Draft telco proposal".to_string(),
                    category: "outreach".to_string(),
                    ..CreateTaskInput::default()
                },
            )
            .await
            .unwrap();
        dashboard
            .tasks()
            .update(
                &ctx(),
                &task.id,
                UpdateTaskInput {
                    status: Some(TaskStatus::InProgress),
                    ..UpdateTaskInput::default()
                },
            )
            .await
            .unwrap();
        dashboard
            .gaps()
            .create(
                &ctx(),
                CreateMarketGapInput {
                    gap_type: GapType::Geographic,
                    title: "Maluku music circuit".to_string(),
                    severity: 7,
                    opportunity: 8,
                    ..CreateMarketGapInput::default()
                },
            )
            .await
            .unwrap();

        let recent = dashboard.activity().recent();
        assert_eq!(recent.len(), before + 3);
        let newest: Vec<_> = recent
            .iter()
            .take(3)
            .map(|entry| (entry.activity_type, entry.entity_type, entry.entity_name.as_str()))
            .collect();
        assert_eq!(
            newest,
            vec![
                (ActivityType::Create, EntityType::MarketGap, "Maluku music circuit"),
                (ActivityType::Update, EntityType::Task, "Draft telco proposal"),
                (ActivityType::Create, EntityType::Task, "Draft telco proposal"),
            ]
        );
        assert_eq!(recent[0].actor_id, Some(ProfileId::new("usr_andi")));
        assert_eq!(
            dashboard.tasks().get(&task.id).unwrap().status,
            TaskStatus::InProgress
        );
    }

    #[tokio::test]
    async fn failed_write_records_no_activity() {
        let (dashboard, backend) = remote(vec![Collection::Tasks]).await;
        let before = backend.select_all(Collection::Activities).await.unwrap().len();

        let err = dashboard
            .tasks()
            .create(
                &ctx(),
                CreateTaskInput {
                    title: "Never saved".to_string(),
                    ..CreateTaskInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Remote(_)));
        assert_eq!(
            err.user_notice(),
            "Could not reach the server. Your change was not saved."
        );
        let after = backend.select_all(Collection::Activities).await.unwrap().len();
        assert_eq!(before, after);
    }

    async fn stored_sponsors_of(backend: &RejectingWrites, event_id: &str) -> Vec<String> {
        backend
            .select_all(Collection::EventSponsors)
            .await
            .unwrap()
            .into_iter()
            .filter(|row| row["event_id"] == event_id)
            .map(|row| row["sponsor_id"].as_str().unwrap().to_string())
            .collect()
    }

    async fn stored_event_name(backend: &RejectingWrites, event_id: &str) -> String {
        backend
            .select_all(Collection::Events)
            .await
            .unwrap()
            .into_iter()
            .find(|row| row["id"] == event_id)
            .map(|row| row["name"].as_str().unwrap().to_string())
            .unwrap()
    }

    #[tokio::test]
    async fn failed_association_insert_removes_the_new_event() {
        let (dashboard, backend) = remote(vec![Collection::EventSponsors]).await;
        let events_before = backend.select_all(Collection::Events).await.unwrap().len();
        let activities_before = backend.select_all(Collection::Activities).await.unwrap().len();

        let err = dashboard
            .events()
            .create(
                &ctx(),
                CreateEventInput {
                    name: "Lombok Surf Classic".to_string(),
                    sponsors: vec![association("spn_kopi-kita", SponsorTier::Gold, 90_000.0)],
                    ..CreateEventInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Remote(BackendError::Unavailable { .. })));
        let events_after = backend.select_all(Collection::Events).await.unwrap();
        assert_eq!(events_after.len(), events_before);
        assert!(events_after.iter().all(|row| row["name"] != "Lombok Surf Classic"));
        let activities_after = backend.select_all(Collection::Activities).await.unwrap().len();
        assert_eq!(activities_after, activities_before);
    }

    #[tokio::test]
    async fn rejected_sponsor_swap_leaves_the_event_unchanged() {
        let (dashboard, backend) = remote(vec![Collection::EventSponsors]).await;
        let activities_before = backend.select_all(Collection::Activities).await.unwrap().len();
        let id = EventId::new("evt_bali-coastal-run-2026");

        let err = dashboard
            .events()
            .update(
                &ctx(),
                &id,
                UpdateEventInput {
                    name: Some("Renamed".to_string()),
                    sponsors: Some(Vec::new()),
                    ..UpdateEventInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Remote(_)));
        assert_eq!(
            stored_event_name(&backend, id.as_str()).await,
            "Bali Coastal Marathon"
        );
        assert_eq!(
            stored_sponsors_of(&backend, id.as_str()).await,
            vec!["spn_nusantara-telco".to_string()]
        );
        let activities_after = backend.select_all(Collection::Activities).await.unwrap().len();
        assert_eq!(activities_after, activities_before);
    }

    #[tokio::test]
    async fn failed_second_association_insert_is_rolled_back() {
        let (dashboard, backend) =
            remote_with(Vec::new(), Some((Collection::EventSponsors, 1))).await;
        let activities_before = backend.select_all(Collection::Activities).await.unwrap().len();
        let id = EventId::new("evt_bali-coastal-run-2026");

        let err = dashboard
            .events()
            .update(
                &ctx(),
                &id,
                UpdateEventInput {
                    name: Some("Renamed".to_string()),
                    sponsors: Some(vec![
                        association("spn_garuda-motors", SponsorTier::Title, 900_000.0),
                        association("spn_kopi-kita", SponsorTier::Silver, 80_000.0),
                    ]),
                    ..UpdateEventInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Remote(_)));
        assert_eq!(
            stored_event_name(&backend, id.as_str()).await,
            "Bali Coastal Marathon"
        );
        assert_eq!(
            stored_sponsors_of(&backend, id.as_str()).await,
            vec!["spn_nusantara-telco".to_string()]
        );
        let activities_after = backend.select_all(Collection::Activities).await.unwrap().len();
        assert_eq!(activities_after, activities_before);
    }

    #[tokio::test]
    async fn failed_association_delete_restores_removed_rows() {
        // Writes: insert garuda (0), delete esp_01 (1), delete esp_02 (2) fails.
        let (dashboard, backend) =
            remote_with(Vec::new(), Some((Collection::EventSponsors, 2))).await;
        let id = EventId::new("evt_harbour-jazz-2025");

        let err = dashboard
            .events()
            .update(
                &ctx(),
                &id,
                UpdateEventInput {
                    sponsors: Some(vec![association(
                        "spn_garuda-motors",
                        SponsorTier::Title,
                        900_000.0,
                    )]),
                    ..UpdateEventInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Remote(_)));
        let mut sponsors = stored_sponsors_of(&backend, id.as_str()).await;
        sponsors.sort();
        assert_eq!(
            sponsors,
            vec!["spn_kopi-kita".to_string(), "spn_nusantara-telco".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_event_patch_puts_sponsors_back() {
        let (dashboard, backend) = remote(vec![Collection::Events]).await;
        let id = EventId::new("evt_bali-coastal-run-2026");

        let err = dashboard
            .events()
            .update(
                &ctx(),
                &id,
                UpdateEventInput {
                    sponsors: Some(vec![association(
                        "spn_garuda-motors",
                        SponsorTier::Title,
                        900_000.0,
                    )]),
                    ..UpdateEventInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Remote(_)));
        assert_eq!(
            stored_sponsors_of(&backend, id.as_str()).await,
            vec!["spn_nusantara-telco".to_string()]
        );
    }

    #[tokio::test]
    async fn sponsor_swap_on_missing_event_is_not_found() {
        let dashboard = offline().await;
        let err = dashboard
            .events()
            .update(
                &ctx(),
                &EventId::new("evt_missing"),
                UpdateEventInput {
                    sponsors: Some(Vec::new()),
                    ..UpdateEventInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::NotFound {
                entity: EntityType::Event,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_activity_append_keeps_the_write() {
        let (dashboard, _backend) = remote(vec![Collection::Activities]).await;
        let before = dashboard.activity().recent().len();

        let draft = dashboard
            .drafts()
            .create(
                &ctx(),
                CreateMyEventInput {
                    name: "Toraja Coffee Trail".to_string(),
                    category: EventCategory::Culinary,
                    budget_goal: 250_000_000.0,
                    ..CreateMyEventInput::default()
                },
            )
            .await
            .unwrap();

        assert!(dashboard.drafts().get(&draft.id).is_some());
        assert_eq!(dashboard.activity().recent().len(), before);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_backend() {
        let dashboard = offline().await;
        let before = dashboard.activity().recent().len();
        let err = dashboard
            .events()
            .create(
                &ctx(),
                CreateEventInput {
                    name: "Backwards Budget".to_string(),
                    budget: BudgetRange {
                        min: 5.0,
                        max: 1.0,
                        ..BudgetRange::default()
                    },
                    ..CreateEventInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Invalid(_)));
        assert_eq!(dashboard.activity().recent().len(), before);
    }

    #[tokio::test]
    async fn missing_entity_is_not_found() {
        let dashboard = offline().await;
        let err = dashboard
            .sponsors()
            .update(
                &ctx(),
                &SponsorId::new("spn_missing"),
                UpdateSponsorInput {
                    average_roi: Some(3.0),
                    ..UpdateSponsorInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::NotFound {
                entity: EntityType::Sponsor,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn replacing_sponsors_updates_back_references() {
        let dashboard = offline().await;
        let id = EventId::new("evt_bali-coastal-run-2026");
        let event = dashboard
            .events()
            .update(
                &ctx(),
                &id,
                UpdateEventInput {
                    sponsors: Some(vec![association(
                        "spn_garuda-motors",
                        SponsorTier::Platinum,
                        400_000_000.0,
                    )]),
                    ..UpdateEventInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(event.sponsors.len(), 1);
        let telco = dashboard
            .sponsors()
            .get(&SponsorId::new("spn_nusantara-telco"))
            .unwrap();
        assert!(!telco.events_sponsored.contains(&id));
        let garuda = dashboard
            .sponsors()
            .get(&SponsorId::new("spn_garuda-motors"))
            .unwrap();
        assert!(garuda.events_sponsored.contains(&id));
    }

    #[tokio::test]
    async fn deleted_sponsor_leaves_dangling_association() {
        let dashboard = offline().await;
        let id = SponsorId::new("spn_segar-retail");
        dashboard.sponsors().delete(&ctx(), &id).await.unwrap();
        assert!(dashboard.sponsors().get(&id).is_none());

        let snapshot = dashboard.snapshot();
        let event = snapshot
            .event(&EventId::new("evt_bandung-culinary-2025"))
            .unwrap();
        assert!(event.has_sponsor(&id));
        assert_eq!(snapshot.resolve_sponsors(event).len(), 1);
    }

    #[tokio::test]
    async fn analysis_falls_back_and_is_written_back() {
        let dashboard = offline().await;
        let id = EventId::new("evt_bandung-culinary-2025");
        let insight = dashboard.insights().analyze_event(&ctx(), &id).await.unwrap();
        assert_eq!(insight.failure, Some(AiError::Unconfigured));
        assert_eq!(insight.value.origin, InsightOrigin::Fallback);
        let report = dashboard.events().get(&id).unwrap().report.unwrap();
        assert!(report.contains("Overall score: 89/100"));
    }

    #[tokio::test]
    async fn strategy_from_service_is_stored_on_draft() {
        let service = ScriptedService::new(vec![Ok(r#"{"sponsorMatches": [
            {"sponsorId": "spn_kopi-kita", "sponsorName": "Kopi Kita", "fitScore": 91, "estimatedRoi": 7.0, "reasoning": "Coffee culture"}
        ]}"#
            .to_string())]);
        let dashboard = Dashboard::new(SyncController::new(None), AiFacade::new(Some(service)));
        dashboard.sync().initialize().await;

        let id = MyEventId::new("mye_makassar-food-week");
        let insight = dashboard.insights().recommend(&ctx(), &id).await.unwrap();
        assert!(!insight.is_fallback());
        let stored = dashboard.drafts().get(&id).unwrap().recommendations.unwrap();
        assert_eq!(stored.sponsor_matches[0].fit_score, 91);
        assert_eq!(stored.origin, InsightOrigin::Service);
    }

    #[tokio::test]
    async fn stats_follow_mutations() {
        let dashboard = offline().await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let before = dashboard.analytics().stats(today);
        dashboard
            .gaps()
            .delete(&ctx(), &MarketGapId::new("gap_eastern-music"))
            .await
            .unwrap();
        let after = dashboard.analytics().stats(today);
        assert_eq!(after.gaps.total, before.gaps.total - 1);
        assert_eq!(after.gaps.high_severity, before.gaps.high_severity - 1);
    }
}
