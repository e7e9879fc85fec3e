//! Foreign-ABI descriptor and timer persistence.

use std::time::Duration;

use mantle_abi::{NativeDescriptor, Timer};
use mantle_persist::{from_bytes, to_bytes};

#[test]
fn opaque_handles_keep_name_and_type() {
    for descriptor in [
        NativeDescriptor::communicator("comm"),
        NativeDescriptor::request("req"),
    ] {
        let restored: NativeDescriptor = from_bytes(&to_bytes(&descriptor).unwrap()).unwrap();
        assert_eq!(restored, descriptor);
        assert!(restored.fields().is_empty());
    }
}

#[test]
fn status_keeps_its_standard_fields() {
    let status = NativeDescriptor::status("status");
    let restored: NativeDescriptor = from_bytes(&to_bytes(&status).unwrap()).unwrap();
    assert_eq!(restored, status);
    let names: Vec<&str> = restored.field_names().collect();
    assert_eq!(names, ["MPI_SOURCE", "MPI_TAG", "MPI_ERROR"]);
}

#[test]
fn neighbourhood_keeps_per_axis_ranks() {
    let nb = NativeDescriptor::neighbourhood("nb", "neighbours0", &["x", "y", "z"]);
    let restored: NativeDescriptor = from_bytes(&to_bytes(&nb).unwrap()).unwrap();
    assert_eq!(restored, nb);
    assert_eq!(restored.type_tag(), "struct neighbours0");
    let names: Vec<&str> = restored.field_names().collect();
    assert_eq!(
        names,
        ["xleft", "xright", "yleft", "yright", "zleft", "zright"]
    );
}

#[test]
fn timer_counters_do_not_travel() {
    let timer = Timer::new("timers", vec!["section0".into(), "section1".into()]);
    timer.record("section0", Duration::from_millis(300));
    timer.record("section1", Duration::from_millis(200));
    assert_eq!(timer.total(), 0.5);

    let restored: Timer = from_bytes(&to_bytes(&timer).unwrap()).unwrap();
    assert_eq!(restored.name(), timer.name());
    assert_eq!(restored.sections(), timer.sections());
    assert_eq!(restored.total(), 0.0);
    assert_eq!(restored.value("section0"), Some(0.0));
    assert_eq!(restored.value("missing"), None);
}
