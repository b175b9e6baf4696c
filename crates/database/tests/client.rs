use database::MemoryDatabase;
use model::{location::Location, path::Waypoint};
use tracker::{
    client::Client,
    database::{Database, LocationRepo, Repo},
    seed::SeedDocument,
    server::Server,
    Entity, RequestError,
};
use utility::{geo::GeoPoint, id::Id};

const SEED: &str = r#"{
    "locations": [
        { "id": 1, "latitude": 0.0, "longitude": 0.0 },
        { "id": 2, "latitude": 0.0, "longitude": 1.0 },
        { "id": 3, "latitude": 0.0, "longitude": 2.0 },
        { "id": 4, "latitude": 0.0, "longitude": 3.0 },
        { "id": 5, "latitude": 0.0, "longitude": 4.0 },
        { "id": 6, "latitude": 1.0, "longitude": 0.0 }
    ],
    "paths": [
        { "pathId": 1, "waypoints": [
            { "location": 1, "distance": 0 },
            { "location": 2, "distance": 100 },
            { "location": 3, "distance": 350 }
        ]},
        { "pathId": 2, "waypoints": [
            { "location": 6, "distance": 0 },
            { "location": 5, "distance": 50 }
        ]}
    ],
    "vehicles": [
        { "id": 1, "name": "31", "pathId": 1, "location": 2 },
        { "id": 2, "name": "32", "pathId": 1 },
        { "id": 3, "name": "40", "pathId": 2, "location": 6 }
    ],
    "stops": [
        { "id": 1, "name": "S1", "location": 1 },
        { "id": 2, "name": "S2", "location": 2 },
        { "id": 3, "name": "S3", "location": 3, "buses": [2, 1] },
        { "id": 4, "name": "S4", "location": 4 },
        { "id": 5, "name": "S5", "location": 5, "buses": [3] }
    ]
}"#;

async fn seeded() -> Client<MemoryDatabase> {
    let client = Server::new(MemoryDatabase::new()).client("test");
    let document = SeedDocument::from_json(SEED).unwrap();
    client.import(document).await.unwrap();
    client
}

fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).unwrap()
}

#[tokio::test]
async fn import_reports_summary() {
    let client = Server::new(MemoryDatabase::new()).client("test");
    let summary = client
        .import(SeedDocument::from_json(SEED).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.locations, 6);
    assert_eq!(summary.waypoints, 5);
    assert_eq!(summary.vehicles, 3);
    assert_eq!(summary.stops, 5);
}

#[tokio::test]
async fn nearest_four_stops() {
    let client = seeded().await;
    let names = client
        .nearest_stops(point(0.0, 0.0))
        .await
        .unwrap()
        .into_iter()
        .map(|stop| stop.content.content.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["S1", "S2", "S3", "S4"]);
}

#[tokio::test]
async fn nearest_stops_never_exceed_stop_count() {
    let client = seeded().await;
    let stops = client.nearest_stops_k(point(10.0, 10.0), 50).await.unwrap();
    assert_eq!(stops.len(), 5);
    for pair in stops.windows(2) {
        assert!(pair[0].distance_meters <= pair[1].distance_meters);
    }
}

#[tokio::test]
async fn distance_to_stop_ahead() {
    let client = seeded().await;
    let distance = client
        .bus_to_stop_distance(Id::new(1), Id::new(3))
        .await
        .unwrap();
    assert_eq!(distance, 250);
}

#[tokio::test]
async fn out_of_order_waypoint_is_rejected_and_other_routes_keep_working() {
    let client = seeded().await;
    let mut db = client.database.auto();
    let waypoint = |order, distance| Waypoint {
        path_id: 9,
        location: None,
        order,
        distance,
    };
    Repo::<Waypoint>::insert(&mut db, waypoint(1, 500)).await.unwrap();
    let result = Repo::<Waypoint>::insert(&mut db, waypoint(2, 10)).await;
    assert!(result.is_err());

    let distance = client
        .bus_to_stop_distance(Id::new(1), Id::new(3))
        .await
        .unwrap();
    assert_eq!(distance, 250);
}

#[tokio::test]
async fn distance_to_passed_stop_is_negative() {
    let client = seeded().await;
    let distance = client
        .bus_to_stop_distance(Id::new(1), Id::new(1))
        .await
        .unwrap();
    assert_eq!(distance, -100);
}

#[tokio::test]
async fn bus_at_stop_is_zero() {
    let client = seeded().await;
    let distance = client
        .bus_to_stop_distance(Id::new(1), Id::new(2))
        .await
        .unwrap();
    assert_eq!(distance, 0);
}

#[tokio::test]
async fn unknown_bus_or_stop() {
    let client = seeded().await;
    assert!(matches!(
        client.bus_to_stop_distance(Id::new(99), Id::new(1)).await,
        Err(RequestError::NotFound(Entity::Vehicle))
    ));
    assert!(matches!(
        client.bus_to_stop_distance(Id::new(1), Id::new(99)).await,
        Err(RequestError::NotFound(Entity::BusStop))
    ));
    assert!(matches!(
        client.get_bus(Id::new(99)).await,
        Err(RequestError::NotFound(Entity::Vehicle))
    ));
}

#[tokio::test]
async fn bus_without_location() {
    let client = seeded().await;
    assert!(matches!(
        client.bus_to_stop_distance(Id::new(2), Id::new(3)).await,
        Err(RequestError::NotFound(Entity::Location))
    ));
}

#[tokio::test]
async fn stop_on_another_route() {
    let client = seeded().await;
    match client.bus_to_stop_distance(Id::new(1), Id::new(5)).await {
        Err(RequestError::RouteMismatch {
            bus_path,
            stop_paths,
        }) => {
            assert_eq!(bus_path, 1);
            assert_eq!(stop_paths, vec![2]);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn stop_off_every_route() {
    let client = seeded().await;
    assert!(matches!(
        client.bus_to_stop_distance(Id::new(1), Id::new(4)).await,
        Err(RequestError::NotFound(Entity::Path))
    ));
}

#[tokio::test]
async fn update_snaps_to_nearest_location() {
    let client = seeded().await;
    let first = client
        .update_vehicle_location(Id::new(2), point(0.0, 2.1))
        .await
        .unwrap();
    assert_eq!(first.content.id, Id::new(3));
    let second = client
        .update_vehicle_location(Id::new(2), point(0.0, 2.1))
        .await
        .unwrap();
    assert_eq!(second.content.id, first.content.id);

    let bus = client.get_bus(Id::new(2)).await.unwrap();
    assert_eq!(bus.content.location, Some(Id::new(3)));
    let distance = client
        .bus_to_stop_distance(Id::new(2), Id::new(3))
        .await
        .unwrap();
    assert_eq!(distance, 0);
}

#[tokio::test]
async fn update_rejects_unknown_bus_and_empty_store() {
    let client = seeded().await;
    assert!(matches!(
        client
            .update_vehicle_location(Id::new(99), point(0.0, 0.0))
            .await,
        Err(RequestError::NotFound(Entity::Vehicle))
    ));

    let empty = Server::new(MemoryDatabase::new()).client("empty");
    let mut db = empty.database.auto();
    let bus = Repo::<model::vehicle::Vehicle>::insert(
        &mut db,
        model::vehicle::Vehicle {
            name: "1".to_owned(),
            path_id: 1,
            location: None,
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        empty.update_vehicle_location(bus.id, point(0.0, 0.0)).await,
        Err(RequestError::NotFound(Entity::Location))
    ));
}

#[tokio::test]
async fn buses_in_association_order() {
    let client = seeded().await;
    let names = client
        .buses_at(Id::new(3))
        .await
        .unwrap()
        .into_iter()
        .map(|bus| bus.content.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["32", "31"]);
    assert!(client.buses_at(Id::new(4)).await.unwrap().is_empty());
    assert!(matches!(
        client.buses_at(Id::new(99)).await,
        Err(RequestError::NotFound(Entity::BusStop))
    ));
}

#[tokio::test]
async fn deleting_a_location_removes_its_stop() {
    let client = seeded().await;
    client
        .database
        .auto()
        .delete_location(Id::new(3))
        .await
        .unwrap();
    assert!(matches!(
        client.get_stop(Id::new(3)).await,
        Err(RequestError::NotFound(Entity::BusStop))
    ));
    let names = client
        .nearest_stops_k(point(0.0, 0.0), 10)
        .await
        .unwrap()
        .into_iter()
        .map(|stop| stop.content.content.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["S1", "S2", "S4", "S5"]);
}

#[tokio::test]
async fn rejected_seed_is_rolled_back() {
    let client = seeded().await;
    let document = SeedDocument::from_json(
        r#"{
            "locations": [{ "id": 7, "latitude": 5.0, "longitude": 5.0 }],
            "paths": [{ "pathId": 1, "waypoints": [
                { "location": 1, "distance": 100 },
                { "location": 2, "distance": 50 }
            ]}]
        }"#,
    )
    .unwrap();
    assert!(matches!(
        client.import(document).await,
        Err(RequestError::InvalidData(_))
    ));

    let locations = Repo::<Location>::get_all(&mut client.database.auto())
        .await
        .unwrap();
    assert_eq!(locations.len(), 6);
    let distance = client
        .bus_to_stop_distance(Id::new(1), Id::new(3))
        .await
        .unwrap();
    assert_eq!(distance, 250);
}

#[tokio::test]
async fn seed_with_dangling_reference() {
    let client = Server::new(MemoryDatabase::new()).client("test");
    let document = SeedDocument::from_json(
        r#"{ "stops": [{ "id": 1, "name": "S1", "location": 42 }] }"#,
    )
    .unwrap();
    assert!(matches!(
        client.import(document).await,
        Err(RequestError::InvalidData(_))
    ));
}
