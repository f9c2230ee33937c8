use std::io::Write;

use arplay::interaction::anchors::HitKind;
use arplay::interaction::caster::cast;
use arplay::interaction::features::{intersect, HitOptions, HitPolicy};
use arplay::interaction::parser::{Event, SessionParser};
use arplay::interaction::placement::Selection;
use arplay::interaction::replay::{Outcome, Replay};
use arplay::interaction::Vec3;

const SCRIPT: &str = r#"
viewport 375 812
camera from (0, 1.4, 0.5) to (0, 0.8, -1.5) fov 60 near 0.001 far 1000
features "cloud.obj"
model "farmHouse" (-2, 0, -2) (2, 3, 2)

tap (187.5, 406)      # place on the tracked points in the middle of the screen
toggleall
pinch 2
toggleall
toggle 0
tap (187.5, 406)      # grabbed object stays under the tap at its own depth
drag 0 (20, 0)
"#;

fn write_cloud(dir: &std::path::Path) {
    let mut file = std::fs::File::create(dir.join("cloud.obj")).unwrap();
    // a small patch of table-top points around (0, 0.8, -1.5) and one stray
    // point behind the camera
    for i in -2..=2 {
        for j in -2..=2 {
            writeln!(file, "v {} 0.8 {}", i as f64 * 0.05, -1.5 + j as f64 * 0.05).unwrap();
        }
    }
    writeln!(file, "v 0 1.4 3").unwrap();
}

#[test]
fn replays_a_session_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_cloud(dir.path());
    let session = SessionParser::new(SCRIPT)
        .with_base_dir(dir.path())
        .parse_session()
        .unwrap();
    assert_eq!(session.cloud.len(), 26);

    let mut replay = Replay::new(HitOptions::default());
    let outcomes = replay.run(&session);
    assert_eq!(outcomes.len(), 7);

    let Outcome::Placed { index: 0, hit } = outcomes[0] else {
        panic!("expected a placement, got {:?}", outcomes[0]);
    };
    let HitKind::FeaturePoint(feature) = hit.kind else {
        panic!("expected a feature hit");
    };
    // OBJ coordinates are single precision
    assert!(feature.feature.distance(Vec3::new(0.0, 0.8, -1.5)) < 1e-6);
    assert!(feature.feature_distance < 1e-6);

    assert_eq!(outcomes[1], Outcome::ToggledAll(Selection::Selected));
    assert_eq!(outcomes[2], Outcome::Pinched { count: 1 });
    assert_eq!(outcomes[3], Outcome::ToggledAll(Selection::Unselected));
    assert!(matches!(outcomes[5], Outcome::Moved { index: 0, .. }));
    assert!(matches!(outcomes[6], Outcome::Dragged { index: 0, .. }));

    let object = &replay.placement().objects()[0];
    assert_eq!(object.name, "farmHouse");
    // bounds 4 x 3 x 4, largest ratio 0.1 / 3, then doubled by the pinch
    assert!((object.scale - 0.2 / 3.0).abs() < 1e-12);
    assert_eq!(object.selection, Selection::Selected);
    assert!(object.position.x > 0.0);
}

#[test]
fn forward_ray_policy_ignores_points_behind_the_camera() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("cloud.obj")).unwrap();
    writeln!(file, "v 0 0 3\nv 0 0.5 -4").unwrap();
    let script = "viewport 100 100\nfeatures \"cloud.obj\"\ntap (50, 50)";
    let session = SessionParser::new(script)
        .with_base_dir(dir.path())
        .parse_session()
        .unwrap();

    let Event::Tap(point) = session.events[0] else {
        panic!("expected a tap");
    };
    let ray = cast(point, Some(&session.camera)).unwrap();
    let line = intersect(&ray, session.cloud.points(), HitPolicy::Line).unwrap();
    assert_eq!(line.feature, Vec3::new(0.0, 0.0, 3.0));
    let forward = intersect(&ray, session.cloud.points(), HitPolicy::ForwardRay).unwrap();
    assert_eq!(forward.feature, Vec3::new(0.0, 0.5, -4.0));

    let parallel = HitOptions::new(HitPolicy::ForwardRay, true);
    let outcomes = Replay::new(parallel).run(&session);
    let Outcome::Placed { hit, .. } = outcomes[0] else {
        panic!("expected a placement, got {:?}", outcomes[0]);
    };
    assert!(hit.position.distance(Vec3::new(0.0, 0.0, -4.0)) < 1e-9);
}
