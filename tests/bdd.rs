use std::{collections::HashMap, fmt, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use tollsim::{
    config::{AppConfig, GeocoderConfig},
    db::{init_pool, run_migrations},
    error::AppError,
    models::{
        coordinate::Coordinate,
        session::SessionContext,
        trip::{NewTrip, Trip},
    },
    services::{
        geocoder::{validate_address, Geocoder},
        simulation::{SimulationReport, SimulationRequest},
        tariff,
    },
    state::AppState,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    session: Option<SessionContext>,
    last_recorded: Option<NewTrip>,
    last_error: Option<AppError>,
    last_report: Option<SimulationReport>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    async fn history(&self, username: &str) -> Vec<Trip> {
        self.app_state()
            .store
            .history(username)
            .await
            .expect("load history")
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

struct KnownPlaces(HashMap<&'static str, (f64, f64)>);

#[async_trait]
impl Geocoder for KnownPlaces {
    async fn resolve(&self, address: &str) -> Result<Coordinate, AppError> {
        let address = validate_address(address)?;
        let (lat, lon) = self
            .0
            .get(address)
            .copied()
            .ok_or_else(|| AppError::GeocodeNotFound(address.to_string()))?;
        Coordinate::new(lat, lon)
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secret: "bdd-cookie-secret".into(),
            geocoder: GeocoderConfig::default(),
            rate_per_km: tariff::DEFAULT_RATE_PER_KM,
            welcome_image: None,
            static_root: PathBuf::from("static"),
        };

        let db = init_pool(&config.database_url).await?;
        run_migrations(&db).await?;

        let mut places = HashMap::new();
        places.insert("Paris, France", (48.8566, 2.3522));
        places.insert("London, UK", (51.5074, -0.1278));

        let app = AppState::new(config, db, Arc::new(KnownPlaces(places)));
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

#[given("a fresh trip store")]
async fn given_fresh_store(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.session = None;
    world.last_recorded = None;
    world.last_error = None;
    world.last_report = None;
}

#[given(regex = r#"^a registered user "([^"]+)"$"#)]
async fn given_registered_user(world: &mut AppWorld, username: String) {
    register(world, &username).await;
}

#[when(regex = r#"^I register the user "([^"]+)"$"#)]
async fn when_register_user(world: &mut AppWorld, username: String) {
    register(world, &username).await;
}

#[given("a session on the simulation screen")]
async fn given_simulation_session(world: &mut AppWorld) {
    let mut session = SessionContext::new();
    session.begin().expect("begin");
    session
        .submit_identity("driver@example.org")
        .expect("identity");
    world.session = Some(session);
}

#[when(
    regex = r#"^I record a trip for "([^"]+)" from (-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?) to (-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)$"#
)]
async fn when_record_trip(
    world: &mut AppWorld,
    username: String,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
) {
    let start = Coordinate::new(start_lat, start_lon).expect("start coordinate");
    let end = Coordinate::new(end_lat, end_lon).expect("end coordinate");
    let distance_km = tariff::distance_km(start, end);
    let trip = NewTrip {
        start,
        end,
        distance_km,
        toll: tariff::toll(distance_km),
    };
    world.last_recorded = Some(trip);
    world.last_error = world
        .app_state()
        .store
        .record_trip(&username, trip)
        .await
        .err();
}

#[when(regex = r#"^"([^"]+)" simulates a trip from "([^"]*)" to "([^"]*)"$"#)]
async fn when_simulate(world: &mut AppWorld, username: String, start: String, end: String) {
    let session = world.session.clone().expect("session must exist first");
    let request = SimulationRequest {
        username: Some(username),
        start_address: start,
        end_address: end,
    };
    let result = world.app_state().simulation.run(&session, &request).await;
    match result {
        Ok(report) => {
            world.last_report = Some(report);
            world.last_error = None;
        }
        Err(err) => {
            world.last_report = None;
            world.last_error = Some(err);
        }
    }
}

#[then(regex = r"^there (?:is|are) (\d+) registered users?$")]
async fn then_user_count(world: &mut AppWorld, expected: i64) {
    let count = world.app_state().store.user_count().await.expect("count");
    assert_eq!(count, expected);
}

#[then(regex = r#"^"([^"]+)" has (\d+) stored trips?$"#)]
async fn then_trip_count(world: &mut AppWorld, username: String, expected: usize) {
    assert_eq!(world.history(&username).await.len(), expected);
}

#[then(regex = r#"^the latest trip for "([^"]+)" matches the recorded values$"#)]
async fn then_latest_matches(world: &mut AppWorld, username: String) {
    let recorded = world.last_recorded.expect("a trip must have been recorded");
    let history = world.history(&username).await;
    let latest = history.last().expect("at least one trip expected");
    assert_eq!(latest.start(), recorded.start);
    assert_eq!(latest.end(), recorded.end);
    assert_eq!(latest.distance, recorded.distance_km);
    assert_eq!(latest.toll, recorded.toll);
}

#[then("the last recording failed because the user is unknown")]
async fn then_unknown_user(world: &mut AppWorld) {
    assert!(
        matches!(world.last_error, Some(AppError::UnknownUser(_))),
        "got {:?}",
        world.last_error
    );
}

#[then(regex = r"^the simulated distance is between (\d+(?:\.\d+)?) and (\d+(?:\.\d+)?) km$")]
async fn then_distance_between(world: &mut AppWorld, low: f64, high: f64) {
    let report = world.last_report.as_ref().expect("simulation must succeed");
    assert!(
        (low..=high).contains(&report.distance_km),
        "distance {}",
        report.distance_km
    );
}

#[then(regex = r"^the simulated toll is between (\d+(?:\.\d+)?) and (\d+(?:\.\d+)?)$")]
async fn then_toll_between(world: &mut AppWorld, low: f64, high: f64) {
    let report = world.last_report.as_ref().expect("simulation must succeed");
    assert!((low..=high).contains(&report.toll), "toll {}", report.toll);
}

#[then("the simulation failed because the address was not found")]
async fn then_not_found(world: &mut AppWorld) {
    assert!(
        matches!(world.last_error, Some(AppError::GeocodeNotFound(_))),
        "got {:?}",
        world.last_error
    );
}

#[then("the simulation failed because the input was invalid")]
async fn then_invalid_input(world: &mut AppWorld) {
    assert!(
        matches!(world.last_error, Some(AppError::InvalidInput(_))),
        "got {:?}",
        world.last_error
    );
}

async fn register(world: &mut AppWorld, username: &str) {
    world
        .app_state()
        .store
        .ensure_user(username)
        .await
        .expect("register user");
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run_and_exit("tests/features")
        .await;
}
