#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ark Descent floor simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative floor, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the floor executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod tuning;

pub use tuning::Tuning;

/// Canonical banner emitted when a floor boots.
pub const WELCOME_BANNER: &str = "Ark Descent floor core online.";

/// Commands that express all permissible floor mutations.
///
/// Player-facing variants correspond one-to-one with the discrete input
/// intents produced by the external input-mapping layer; the remaining
/// variants are issued by pure systems in response to events.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Records the directional input sample consumed by the next tick.
    Steer {
        /// Held-direction flags for the current frame.
        input: MoveInput,
    },
    /// Requests an auto-path toward the provided goal cell.
    AutoPathTo {
        /// Cell the player asked to walk to.
        goal: CellCoord,
    },
    /// Installs a planned path for the player to follow.
    AssignPath {
        /// Ordered cells from the player's position toward the goal,
        /// excluding the cell the player currently occupies.
        path: Vec<CellCoord>,
        /// Goal the path was planned against.
        goal: CellCoord,
    },
    /// Attempts to fire the player's weapon along the aim vector.
    Fire {
        /// Direction of the shot in map units; need not be normalized.
        aim: MapVec,
    },
    /// Begins a reload if the clip is not full and no reload is running.
    Reload,
    /// Activates the nearest trigger zone within interaction range.
    Interact,
    /// Advances the briefing sequencer by one confirmation.
    Confirm,
    /// Requests an enemy aggression phase change on behalf of the AI system.
    SetEnemyPhase {
        /// Enemy whose phase should change.
        enemy: EnemyId,
        /// Requested transition; the floor validates it before applying.
        request: EnemyPhaseRequest,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the floor after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved between two map positions.
    PlayerMoved {
        /// Position before the move.
        from: MapPoint,
        /// Position after the move.
        to: MapPoint,
    },
    /// Reports damage applied to the player.
    PlayerDamaged {
        /// Hit points removed by the strike.
        amount: u32,
        /// Health remaining after the damage was applied.
        remaining: Health,
    },
    /// Reports regeneration applied to the player.
    PlayerHealed {
        /// Hit points restored.
        amount: u32,
        /// Health after the heal.
        remaining: Health,
    },
    /// Announces that the player asked for a path and planning is required.
    AutoPathRequested {
        /// Cell the player currently occupies.
        start: CellCoord,
        /// Cell the player asked to reach.
        goal: CellCoord,
    },
    /// Confirms that a planned path was installed for the player.
    PathAssigned {
        /// Goal the path leads toward.
        goal: CellCoord,
        /// Number of cells in the installed path.
        length: usize,
    },
    /// Reports that a cell on the active path became blocking.
    ///
    /// The player keeps walking the still-valid prefix; the autopath system
    /// answers with a fresh [`Command::AssignPath`].
    PathInvalidated {
        /// Goal the invalidated path was planned against.
        goal: CellCoord,
        /// Cell whose state change broke the path.
        blocked: CellCoord,
    },
    /// Confirms that the player consumed the final cell of a path.
    PathCompleted {
        /// Goal that was reached.
        goal: CellCoord,
    },
    /// Confirms that a projectile entered the world.
    ProjectileSpawned {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Muzzle position in map units.
        origin: MapPoint,
        /// Normalized travel direction.
        direction: MapVec,
    },
    /// Confirms that a projectile left the world.
    ProjectileDestroyed {
        /// Identifier of the destroyed projectile.
        projectile: ProjectileId,
        /// What ended the projectile's flight.
        impact: ProjectileImpact,
    },
    /// Announces that a reload began.
    ReloadStarted,
    /// Announces that a reload finished and the clip was refilled.
    ReloadCompleted,
    /// Confirms that an enemy moved between two map positions.
    EnemyMoved {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Position before the move.
        from: MapPoint,
        /// Position after the move.
        to: MapPoint,
    },
    /// Announces that an enemy entered a new aggression phase.
    EnemyPhaseChanged {
        /// Enemy whose phase changed.
        enemy: EnemyId,
        /// Phase that became active.
        phase: EnemyPhase,
    },
    /// Reports damage applied to an enemy.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Hit points removed.
        amount: u32,
        /// Health remaining after the hit.
        remaining: Health,
    },
    /// Reports that an enemy's strike frame executed.
    EnemyStruck {
        /// Enemy whose windup elapsed.
        enemy: EnemyId,
        /// Whether the player was inside strike range on the strike frame.
        connected: bool,
    },
    /// Confirms that a faded enemy was removed from the floor.
    EnemyRemoved {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Reports that a grid cell changed walkability.
    CellStateChanged {
        /// Cell that changed.
        cell: CellCoord,
        /// State the cell transitioned to.
        state: CellState,
    },
    /// Announces that the player entered a trigger zone.
    TriggerEntered {
        /// Identifier of the entered zone.
        trigger: TriggerId,
    },
    /// Confirms that the player activated an interactable trigger.
    InteractionActivated {
        /// Identifier of the activated zone.
        trigger: TriggerId,
    },
    /// Announces a quest stage transition.
    QuestStageChanged {
        /// Stage that was left.
        from: QuestStage,
        /// Stage that became current.
        to: QuestStage,
    },
    /// Announces that a gated floor feature unlocked; unlocks never regress.
    FeatureUnlocked {
        /// Feature that became available.
        feature: Feature,
    },
    /// Asks the external shell to swap floors.
    FloorExitRequested {
        /// Floor the activated exit leads to.
        to_floor: FloorId,
    },
    /// Reports that the briefing advanced to a new line.
    BriefingAdvanced {
        /// Zero-based index of the line now being revealed.
        line: usize,
    },
    /// Reports that the briefing finished all its lines.
    BriefingCompleted,
}

/// Unique identifier assigned to an enemy at spawn time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a floor, expressed as the level number painted on it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FloorId(u16);

impl FloorId {
    /// Creates a floor identifier from its level number.
    #[must_use]
    pub const fn new(level: u16) -> Self {
        Self(level)
    }

    /// Retrieves the level number of the floor.
    #[must_use]
    pub const fn level(&self) -> u16 {
        self.0
    }
}

/// Name of a trigger zone as authored in map data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(String);

impl TriggerId {
    /// Creates a trigger identifier from its authored name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Retrieves the authored name of the trigger.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Applies a signed offset, returning `None` when leaving quadrant zero.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }
}

/// Continuous position in map units with sub-cell precision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    x: f32,
    y: f32,
}

impl MapPoint {
    /// Creates a new map position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in map units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component in map units.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Translates the point by the provided vector.
    #[must_use]
    pub fn offset(self, delta: MapVec) -> MapPoint {
        MapPoint::new(self.x + delta.x(), self.y + delta.y())
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: MapPoint) -> f32 {
        self.vector_to(other).length()
    }

    /// Vector pointing from this point toward another.
    #[must_use]
    pub fn vector_to(self, other: MapPoint) -> MapVec {
        MapVec::new(other.x - self.x, other.y - self.y)
    }

    /// Grid cell containing the point for the provided cell size.
    ///
    /// Negative coordinates clamp to the first column or row so callers
    /// always receive a coordinate inside quadrant zero.
    #[must_use]
    pub fn to_cell(self, cell_size: u32) -> CellCoord {
        let size = cell_size.max(1) as f32;
        let column = (self.x / size).floor().max(0.0) as u32;
        let row = (self.y / size).floor().max(0.0) as u32;
        CellCoord::new(column, row)
    }

    /// Center of the provided cell for the given cell size.
    #[must_use]
    pub fn cell_center(cell: CellCoord, cell_size: u32) -> MapPoint {
        let size = cell_size.max(1) as f32;
        MapPoint::new(
            cell.column() as f32 * size + size / 2.0,
            cell.row() as f32 * size + size / 2.0,
        )
    }
}

/// Displacement or direction in map units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapVec {
    x: f32,
    y: f32,
}

impl MapVec {
    /// The zero vector.
    pub const ZERO: MapVec = MapVec::new(0.0, 0.0);

    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit-length copy of the vector, or `None` for the zero vector.
    #[must_use]
    pub fn normalized(self) -> Option<MapVec> {
        let length = self.length();
        if length <= f32::EPSILON {
            return None;
        }
        Some(MapVec::new(self.x / length, self.y / length))
    }

    /// Scales both components by the provided factor.
    #[must_use]
    pub fn scaled(self, factor: f32) -> MapVec {
        MapVec::new(self.x * factor, self.y * factor)
    }
}

/// Axis-aligned rectangle in map units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl MapRect {
    /// Constructs a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Reports whether the point lies inside the rectangle (inclusive).
    #[must_use]
    pub fn contains(&self, point: MapPoint) -> bool {
        point.x() >= self.min_x
            && point.x() <= self.max_x
            && point.y() >= self.min_y
            && point.y() <= self.max_y
    }

    /// Distance from the point to the nearest edge, zero when inside.
    #[must_use]
    pub fn distance_to(&self, point: MapPoint) -> f32 {
        let clamped_x = point.x().clamp(self.min_x, self.max_x);
        let clamped_y = point.y().clamp(self.min_y, self.max_y);
        point.distance_to(MapPoint::new(clamped_x, clamped_y))
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> MapPoint {
        MapPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Walkability state of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Traversable floor.
    Open,
    /// Impassable wall or obstacle.
    Blocking,
}

/// Held-direction flags sampled from the input layer each frame.
///
/// Opposite held directions cancel each other; the floor latches the
/// conflicting axis at zero until both keys release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveInput {
    /// Leftward key held.
    pub left: bool,
    /// Rightward key held.
    pub right: bool,
    /// Upward key held.
    pub up: bool,
    /// Downward key held.
    pub down: bool,
}

impl MoveInput {
    /// Reports whether no direction is held at all.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.left && !self.right && !self.up && !self.down
    }
}

/// Category of a trigger zone, including its exit destination when relevant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Floor exit such as the elevator; gated by a quest feature.
    Exit {
        /// Floor the exit leads to.
        to_floor: FloorId,
    },
    /// Readable terminal containing a log entry.
    Terminal,
    /// Examinable picture frame or keepsake.
    Frame,
    /// Physical switch or relay.
    Switch,
    /// Non-player entity that can be confronted.
    Npc,
}

/// Named map region that causes an event when entered or activated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerZone {
    /// Authored identifier of the zone.
    pub id: TriggerId,
    /// Category and destination of the zone.
    pub kind: TriggerKind,
    /// Region covered by the zone in map units.
    pub region: MapRect,
}

/// Ordered quest checkpoint within a floor's stage chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestStage {
    /// Dormitory floor: waiting for the system to come online.
    Intro,
    /// Dormitory floor: free exploration of the room.
    Explore,
    /// Dormitory floor: hostiles engaged.
    Combat,
    /// Dormitory floor: the security log has become the objective.
    Log,
    /// Dormitory floor: the elevator is the objective.
    Elevator,
    /// Laboratory floor: arrival.
    LabIntro,
    /// Laboratory floor: crossing the lab.
    LabPath,
    /// Laboratory floor: the route forks.
    LabChoice,
    /// Laboratory floor: the confrontation branch was chosen.
    LabBypass,
    /// Laboratory floor: the relay branch was chosen.
    LabSwitch,
    /// Laboratory floor: the exit is the objective.
    LabExit,
    /// Transit floor with no scripted objectives.
    Passage,
}

/// Floor feature gated behind quest progression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// The elevator connecting floors.
    Elevator,
}

/// Discrete occurrence evaluated by the quest state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestEventId {
    /// The opening briefing ran to completion.
    BriefingComplete,
    /// An enemy became alert for the first time on this floor.
    ThreatEngaged,
    /// The last hostile enemy on the floor died.
    FloorCleared,
    /// A terminal or frame with the given identifier was read.
    LogRead(TriggerId),
    /// A switch with the given identifier was activated.
    SwitchActivated(TriggerId),
    /// An NPC with the given identifier was confronted.
    NpcResolved(TriggerId),
}

/// Aggression phase of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyPhase {
    /// Unaware of the player.
    Idle,
    /// Aware and advancing toward the player.
    Alert,
    /// Committed to a strike; cannot be interrupted until it lands.
    Windup,
    /// Dead and fading out; excluded from collision and targeting.
    Fading,
}

/// Phase transition requested by the AI system; validated by the floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyPhaseRequest {
    /// Idle → Alert.
    Alert,
    /// Alert → Idle.
    StandDown,
    /// Alert → Windup, accepted only with the attack cooldown elapsed.
    BeginWindup,
}

/// What ended a projectile's flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileImpact {
    /// The projectile entered a blocking cell.
    Terrain,
    /// The projectile hit the identified enemy.
    HitEnemy(EnemyId),
    /// The projectile's lifetime ran out.
    Expired,
}

/// Hit points wrapper with saturating arithmetic.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Health(u32);

impl Health {
    /// Creates a health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Removes hit points, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, amount: u32) -> Health {
        Health(self.0.saturating_sub(amount))
    }

    /// Restores hit points without exceeding the provided maximum.
    #[must_use]
    pub fn saturating_add_capped(self, amount: u32, max: Health) -> Health {
        Health(self.0.saturating_add(amount).min(max.0))
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Activation schedule of a trap or energy wall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrapSchedule {
    /// Cells collapse permanently after the delay and never reopen.
    Collapse {
        /// Seconds of simulated time before the collapse.
        after_secs: f32,
    },
    /// Cells alternate between open and closed phases indefinitely.
    Periodic {
        /// Seconds spent open each cycle.
        open_secs: f32,
        /// Seconds spent closed each cycle.
        closed_secs: f32,
        /// Whether the trap starts in its closed phase.
        start_closed: bool,
    },
}

/// Load-time description of a trap and the cells it governs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrapSpec {
    /// Cells toggled by the trap.
    pub cells: Vec<CellCoord>,
    /// Activation schedule.
    pub schedule: TrapSchedule,
}

/// Validated, load-time description of one floor.
///
/// Produced by the content adapter; the simulation crates trust it and
/// re-check only bounds at runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct FloorPlan {
    /// Identifier of the floor.
    pub floor: FloorId,
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a square cell in map units.
    pub cell_size: u32,
    /// Row-major walkability states, `columns * rows` entries.
    pub cells: Vec<CellState>,
    /// Player spawn position in map units.
    pub spawn: MapPoint,
    /// Trigger zones authored for the floor.
    pub triggers: Vec<TriggerZone>,
    /// Traps and energy walls authored for the floor.
    pub traps: Vec<TrapSpec>,
    /// Concrete enemy spawn cells.
    pub enemy_spawns: Vec<CellCoord>,
    /// Number of briefing lines to sequence before play begins.
    pub briefing_lines: usize,
    /// Numeric tuning applied to the floor.
    pub tuning: Tuning,
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Continuous position in map units.
    pub position: MapPoint,
    /// Grid cell containing the position.
    pub cell: CellCoord,
    /// Last movement or aim direction.
    pub facing: MapVec,
    /// Current health.
    pub health: Health,
    /// Maximum health.
    pub max_health: Health,
    /// Rounds left in the clip.
    pub ammo: u32,
    /// Time left before the weapon can fire again.
    pub cooldown_remaining: Duration,
    /// Time left on the running reload, if one is in progress.
    pub reload_remaining: Option<Duration>,
    /// Goal of the active auto-path, if any.
    pub path_goal: Option<CellCoord>,
    /// Cells remaining on the active auto-path.
    pub path_length: usize,
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned at spawn.
    pub id: EnemyId,
    /// Continuous position in map units.
    pub position: MapPoint,
    /// Grid cell containing the position.
    pub cell: CellCoord,
    /// Current aggression phase.
    pub phase: EnemyPhase,
    /// Current health.
    pub health: Health,
    /// Time left on the committed windup, if winding up.
    pub windup_remaining: Duration,
    /// Time left before the enemy may begin another attack.
    pub cooldown_remaining: Duration,
    /// Time left on the death fade, if fading.
    pub fade_remaining: Duration,
}

/// Read-only snapshot describing all enemies on the floor.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier assigned at spawn.
    pub id: ProjectileId,
    /// Continuous position in map units.
    pub position: MapPoint,
    /// Normalized travel direction.
    pub direction: MapVec,
    /// Time left before the projectile expires.
    pub lifetime_remaining: Duration,
}

/// Read-only snapshot describing all live projectiles.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Read-only view of the walkability grid.
///
/// Out-of-bounds queries report blocking cells so callers never have to
/// special-case the floor perimeter.
#[derive(Clone, Debug)]
pub struct GridView<'a> {
    cells: Cow<'a, [CellState]>,
    columns: u32,
    rows: u32,
    cell_size: u32,
    revision: u64,
}

impl<'a> GridView<'a> {
    /// Captures a view backed by the provided borrowed cell slice.
    #[must_use]
    pub fn new(
        cells: &'a [CellState],
        columns: u32,
        rows: u32,
        cell_size: u32,
        revision: u64,
    ) -> Self {
        Self {
            cells: Cow::Borrowed(cells),
            columns,
            rows,
            cell_size,
            revision,
        }
    }

    /// Captures a view that owns its cells; used by tests and fixtures.
    #[must_use]
    pub fn from_owned(
        cells: Vec<CellState>,
        columns: u32,
        rows: u32,
        cell_size: u32,
    ) -> GridView<'static> {
        GridView {
            cells: Cow::Owned(cells),
            columns,
            rows,
            cell_size,
            revision: 0,
        }
    }

    /// State of the provided cell; blocking when out of bounds.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellState::Blocking)
    }

    /// Reports whether the cell is open for traversal.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.state(cell) == CellState::Open
    }

    /// Provides the dimensions of the grid in cells.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a square cell in map units.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Mutation counter; differs whenever any cell changed state.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, CellState, EnemyId, Feature, FloorId, GridView, Health, MapPoint,
        MapRect, MapVec, MoveInput, ProjectileId, QuestStage, TriggerId,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn cell_offset_rejects_negative_coordinates() {
        let origin = CellCoord::new(0, 2);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, -2), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn map_point_converts_to_cell_with_clamping() {
        assert_eq!(MapPoint::new(5.0, 9.9).to_cell(2), CellCoord::new(2, 4));
        assert_eq!(MapPoint::new(-3.0, 1.0).to_cell(2), CellCoord::new(0, 0));
    }

    #[test]
    fn cell_center_is_midpoint() {
        let center = MapPoint::cell_center(CellCoord::new(3, 1), 4);
        assert_eq!(center, MapPoint::new(14.0, 6.0));
    }

    #[test]
    fn normalized_rejects_zero_vector() {
        assert_eq!(MapVec::ZERO.normalized(), None);
        let unit = MapVec::new(3.0, 4.0).normalized().expect("unit vector");
        assert!((unit.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rect_distance_is_zero_inside() {
        let rect = MapRect::from_corners(10.0, 10.0, 20.0, 30.0);
        assert_eq!(rect.distance_to(MapPoint::new(15.0, 20.0)), 0.0);
        assert!((rect.distance_to(MapPoint::new(25.0, 20.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_holds_report_not_idle() {
        let input = MoveInput {
            left: true,
            right: true,
            up: false,
            down: false,
        };
        assert!(!input.is_idle());
        assert!(MoveInput::default().is_idle());
    }

    #[test]
    fn health_saturates_at_zero_and_cap() {
        let health = Health::new(5);
        assert_eq!(health.saturating_sub(9), Health::new(0));
        assert!(health.saturating_sub(9).is_zero());
        assert_eq!(
            Health::new(98).saturating_add_capped(5, Health::new(100)),
            Health::new(100)
        );
    }

    #[test]
    fn grid_view_reports_blocking_out_of_bounds() {
        let view = GridView::from_owned(vec![CellState::Open; 4], 2, 2, 2);
        assert!(view.is_walkable(CellCoord::new(1, 1)));
        assert!(!view.is_walkable(CellCoord::new(2, 0)));
        assert_eq!(view.state(CellCoord::new(0, 9)), CellState::Blocking);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn enemy_id_round_trips_through_bincode() {
        assert_round_trip(&EnemyId::new(42));
    }

    #[test]
    fn projectile_id_round_trips_through_bincode() {
        assert_round_trip(&ProjectileId::new(7));
    }

    #[test]
    fn floor_id_round_trips_through_bincode() {
        assert_round_trip(&FloorId::new(50));
    }

    #[test]
    fn trigger_id_round_trips_through_bincode() {
        assert_round_trip(&TriggerId::new("log_kaines_001"));
    }

    #[test]
    fn quest_stage_round_trips_through_bincode() {
        assert_round_trip(&QuestStage::LabChoice);
    }

    #[test]
    fn feature_round_trips_through_bincode() {
        assert_round_trip(&Feature::Elevator);
    }
}
