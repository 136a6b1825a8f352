//! League document store with batched multi-document writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, info, warn};

use super::{EntityType, JsonlReader, JsonlWriter, StagedFile, StorageConfig, StorageError};
use crate::calculate::Reconciliation;
use crate::models::{Season, SeasonId, Team, TeamId};

/// A single document change.
#[derive(Debug, Clone)]
pub enum Mutation {
    PutSeason(Season),
    DeleteSeason(SeasonId),
    PutTeam(Team),
    DeleteTeam(TeamId),
}

/// A set of document changes that are written together.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_season(mut self, season: Season) -> Self {
        self.mutations.push(Mutation::PutSeason(season));
        self
    }

    pub fn delete_season(mut self, id: SeasonId) -> Self {
        self.mutations.push(Mutation::DeleteSeason(id));
        self
    }

    pub fn put_team(mut self, team: Team) -> Self {
        self.mutations.push(Mutation::PutTeam(team));
        self
    }

    pub fn put_teams(mut self, teams: impl IntoIterator<Item = Team>) -> Self {
        self.mutations
            .extend(teams.into_iter().map(Mutation::PutTeam));
        self
    }

    pub fn delete_team(mut self, id: TeamId) -> Self {
        self.mutations.push(Mutation::DeleteTeam(id));
        self
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }
}

impl From<Reconciliation> for WriteBatch {
    fn from(r: Reconciliation) -> Self {
        WriteBatch::new()
            .put_season(r.season)
            .put_team(r.home_team)
            .put_team(r.away_team)
    }
}

/// Seasons and teams persisted as JSONL documents.
///
/// Writes are serialized through an internal lock. A batch stages both
/// collections in full before either live file is replaced, and a failed
/// replacement restores the files already replaced.
#[derive(Debug)]
pub struct LeagueStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl LeagueStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn seasons(&self) -> Result<Vec<Season>, StorageError> {
        JsonlReader::for_entity(&self.config, EntityType::Season).read_all()
    }

    pub fn season(&self, id: &SeasonId) -> Result<Option<Season>, StorageError> {
        let found = JsonlReader::<Season>::for_entity(&self.config, EntityType::Season)
            .read_where(|s| &s.id == id)?;
        Ok(found.into_iter().next())
    }

    pub fn teams(&self) -> Result<Vec<Team>, StorageError> {
        JsonlReader::for_entity(&self.config, EntityType::Team).read_all()
    }

    /// Teams registered for a season.
    pub fn teams_in(&self, season_id: &SeasonId) -> Result<Vec<Team>, StorageError> {
        JsonlReader::<Team>::for_entity(&self.config, EntityType::Team)
            .read_where(|t| t.plays_in(season_id))
    }

    pub fn team(&self, id: &TeamId) -> Result<Option<Team>, StorageError> {
        let found = JsonlReader::<Team>::for_entity(&self.config, EntityType::Team)
            .read_where(|t| &t.id == id)?;
        Ok(found.into_iter().next())
    }

    /// Every season and team, failing on any unreadable document.
    ///
    /// Counter rebuilds read through here so a damaged season cannot
    /// silently drop its goals from the recount.
    pub fn snapshot(&self) -> Result<(Vec<Season>, Vec<Team>), StorageError> {
        let seasons = JsonlReader::<Season>::for_entity(&self.config, EntityType::Season)
            .read_all_strict()?;
        let teams =
            JsonlReader::<Team>::for_entity(&self.config, EntityType::Team).read_all_strict()?;
        Ok((seasons, teams))
    }

    /// Apply every mutation of `batch`, or none of them.
    ///
    /// Refuses to write when either collection holds an unreadable document.
    pub fn apply(&self, batch: WriteBatch) -> Result<usize, StorageError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;

        let (mut seasons, mut teams) = self.snapshot()?;
        let mut seasons_touched = false;
        let mut teams_touched = false;

        let applied = batch.len();
        for mutation in batch.mutations {
            match mutation {
                Mutation::PutSeason(season) => {
                    upsert(&mut seasons, season, |s| &s.id);
                    seasons_touched = true;
                }
                Mutation::DeleteSeason(id) => {
                    seasons.retain(|s| s.id != id);
                    seasons_touched = true;
                }
                Mutation::PutTeam(team) => {
                    upsert(&mut teams, team, |t| &t.id);
                    teams_touched = true;
                }
                Mutation::DeleteTeam(id) => {
                    teams.retain(|t| t.id != id);
                    teams_touched = true;
                }
            }
        }

        let mut staged = Vec::new();
        if seasons_touched {
            staged.push(JsonlWriter::for_entity(&self.config, EntityType::Season).stage(&seasons)?);
        }
        if teams_touched {
            match JsonlWriter::for_entity(&self.config, EntityType::Team).stage(&teams) {
                Ok(file) => staged.push(file),
                Err(e) => {
                    staged.into_iter().for_each(StagedFile::discard);
                    return Err(e);
                }
            }
        }
        commit_together(staged)?;

        info!("Applied write batch of {} documents", applied);
        Ok(applied)
    }
}

/// Commit staged files in order. If any commit fails, the remaining stages
/// are discarded and the files already replaced get their old contents back.
fn commit_together(staged: Vec<StagedFile>) -> Result<(), StorageError> {
    let mut replaced: Vec<Rollback> = Vec::new();
    let mut pending = staged.into_iter();

    while let Some(file) = pending.next() {
        let rollback = match Rollback::prepare(file.target()) {
            Ok(rollback) => rollback,
            Err(e) => {
                file.discard();
                abort(replaced, pending);
                return Err(e);
            }
        };
        if let Err(e) = file.commit() {
            rollback.release();
            abort(replaced, pending);
            return Err(e);
        }
        replaced.push(rollback);
    }

    replaced.into_iter().for_each(Rollback::release);
    Ok(())
}

fn abort(replaced: Vec<Rollback>, pending: impl Iterator<Item = StagedFile>) {
    pending.for_each(StagedFile::discard);
    for rollback in replaced.into_iter().rev() {
        rollback.restore();
    }
}

/// The previous contents of a live file, kept as a hard link while a batch
/// commits.
struct Rollback {
    path: PathBuf,
    backup: Option<PathBuf>,
}

impl Rollback {
    fn prepare(path: &Path) -> Result<Self, StorageError> {
        if !path.is_file() {
            return Ok(Self {
                path: path.to_path_buf(),
                backup: None,
            });
        }

        let backup = path.with_extension("jsonl.bak");
        if backup.exists() {
            fs::remove_file(&backup)?;
        }
        fs::hard_link(path, &backup)?;
        Ok(Self {
            path: path.to_path_buf(),
            backup: Some(backup),
        })
    }

    /// Put the old contents back (or remove a file that did not exist).
    fn restore(self) {
        let outcome = match &self.backup {
            Some(backup) => fs::rename(backup, &self.path),
            None => fs::remove_file(&self.path),
        };
        match outcome {
            Ok(()) => warn!("Rolled back {:?}", self.path),
            Err(e) => error!("Failed to roll back {:?}: {}", self.path, e),
        }
    }

    fn release(self) {
        if let Some(backup) = &self.backup {
            if let Err(e) = fs::remove_file(backup) {
                warn!("Failed to remove backup {:?}: {}", backup, e);
            }
        }
    }
}

fn upsert<T, F>(docs: &mut Vec<T>, doc: T, key: F)
where
    F: Fn(&T) -> &crate::models::EntityId,
{
    match docs.iter().position(|d| key(d) == key(&doc)) {
        Some(i) => docs[i] = doc,
        None => docs.push(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::apply_match_result;
    use crate::models::{EntityId, Goal, MatchGoals, MatchResult, Member, PointsSystem};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LeagueStore {
        LeagueStore::new(StorageConfig::new(dir.path().to_path_buf()))
    }

    fn season(name: &str) -> Season {
        Season::new(
            name.to_string(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
            PointsSystem::default(),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_store_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.seasons().unwrap().is_empty());
        assert!(store.teams().unwrap().is_empty());
        assert!(store.season(&"nope".into()).unwrap().is_none());
    }

    #[test]
    fn test_apply_upserts_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let first = season("First");
        let second = season("Second");

        store
            .apply(WriteBatch::new().put_season(first.clone()).put_season(second.clone()))
            .unwrap();

        let mut renamed = first.clone();
        renamed.name = "First (renamed)".to_string();
        store.apply(WriteBatch::new().put_season(renamed)).unwrap();

        let seasons = store.seasons().unwrap();
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].name, "First (renamed)");
        assert_eq!(seasons[1].id, second.id);
    }

    #[test]
    fn test_apply_deletes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let team = Team::new("Rovers".to_string(), None);
        store.apply(WriteBatch::new().put_team(team.clone())).unwrap();
        assert!(store.team(&team.id).unwrap().is_some());

        store.apply(WriteBatch::new().delete_team(team.id.clone())).unwrap();
        assert!(store.team(&team.id).unwrap().is_none());
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.apply(WriteBatch::new()).unwrap(), 0);
        assert!(!store.config().documents_dir().exists());
    }

    #[test]
    fn test_reconciliation_batch_persists_all_documents() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut s = season("League");
        let mut home = Team::new("Home".to_string(), None);
        let mut away = Team::new("Away".to_string(), None);
        home.register_for(s.id.clone());
        away.register_for(s.id.clone());
        home.members
            .push(Member::with_id(EntityId::from("h9"), "Striker".to_string(), 9));
        let round_id = s.add_round(1).unwrap().id.clone();
        let match_id = s
            .add_match(
                &round_id,
                home.id.clone(),
                away.id.clone(),
                NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                &[home.clone(), away.clone()],
            )
            .unwrap()
            .id
            .clone();
        store
            .apply(
                WriteBatch::new()
                    .put_season(s.clone())
                    .put_teams([home.clone(), away.clone()]),
            )
            .unwrap();

        let result = MatchResult::from_goals(MatchGoals {
            home: vec![Goal::regular("h9".into(), None)],
            away: vec![],
        });
        let reconciliation = apply_match_result(&s, &[home.clone(), away], &match_id, result).unwrap();
        assert_eq!(store.apply(reconciliation.into()).unwrap(), 3);

        let stored = store.season(&s.id).unwrap().unwrap();
        assert!(stored.find_match(&match_id).unwrap().1.completed_result().is_some());
        let stored_home = store.team(&home.id).unwrap().unwrap();
        assert_eq!(stored_home.members[0].stats.goals, 1);
    }

    #[test]
    fn test_apply_refuses_to_drop_unreadable_documents() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .apply(WriteBatch::new().put_team(Team::new("Alpha".to_string(), None)))
            .unwrap();

        let path = store.config().entity_path(EntityType::Team);
        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push_str("{\"id\":\"legacy\",\"name\":\"Legacy\",\"members\":\"oops\"}\n");
        fs::write(&path, &contents).unwrap();

        let err = store
            .apply(WriteBatch::new().put_team(Team::new("Gamma".to_string(), None)))
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
        assert!(matches!(store.snapshot(), Err(StorageError::Corrupt { .. })));
        // Lenient reads still serve the readable documents.
        assert_eq!(store.teams().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_commit_restores_earlier_files() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::new(dir.path().to_path_buf());
        let seasons_path = config.entity_path(EntityType::Season);
        let blocked = dir.path().join("blocked.jsonl");
        let fresh = dir.path().join("fresh.jsonl");

        JsonlWriter::<Season>::new(seasons_path.clone())
            .write_all(&[season("Before")])
            .unwrap();
        let before = fs::read_to_string(&seasons_path).unwrap();
        fs::create_dir(&blocked).unwrap();

        let staged = vec![
            JsonlWriter::<Season>::new(seasons_path.clone())
                .stage(&[season("After")])
                .unwrap(),
            JsonlWriter::<Season>::new(fresh.clone())
                .stage(&[season("New")])
                .unwrap(),
            JsonlWriter::<Team>::new(blocked.clone())
                .stage(&[Team::new("Rovers".to_string(), None)])
                .unwrap(),
        ];
        assert!(commit_together(staged).is_err());

        assert_eq!(fs::read_to_string(&seasons_path).unwrap(), before);
        assert!(!fresh.exists());
        assert!(blocked.is_dir());
        for leftover in [
            seasons_path.with_extension("jsonl.tmp"),
            seasons_path.with_extension("jsonl.bak"),
            fresh.with_extension("jsonl.tmp"),
            blocked.with_extension("jsonl.tmp"),
        ] {
            assert!(!leftover.exists(), "{:?} left behind", leftover);
        }
    }

    #[test]
    fn test_commit_together_leaves_no_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seasons.jsonl");
        let writer: JsonlWriter<Season> = JsonlWriter::new(path.clone());
        writer.write_all(&[season("Before")]).unwrap();

        commit_together(vec![writer.stage(&[season("After")]).unwrap()]).unwrap();

        let read: Vec<Season> = JsonlReader::new(path.clone()).read_all().unwrap();
        assert_eq!(read[0].name, "After");
        assert!(!path.with_extension("jsonl.bak").exists());
    }

    #[test]
    fn test_teams_in_filters_by_registration() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let s = season("League");
        let mut registered = Team::new("In".to_string(), None);
        registered.register_for(s.id.clone());
        let other = Team::new("Out".to_string(), None);
        store
            .apply(WriteBatch::new().put_teams([registered.clone(), other]))
            .unwrap();

        let teams = store.teams_in(&s.id).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].id, registered.id);
    }
}
