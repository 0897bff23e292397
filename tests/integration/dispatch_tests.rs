//! Integration tests for the JSON command path: frame in, response out.

use crate::mock_hw::{EventLog, MockMachine, StatusLog, test_config};

use serde_json::Value;
use vlm::app::service::AppService;
use vlm::dispatch::{Dispatcher, channels};

struct Rig {
    dispatcher: Dispatcher,
    app: AppService,
    hw: MockMachine,
    status: StatusLog,
    events: EventLog,
}

impl Rig {
    fn new() -> Self {
        Self::with_machine(MockMachine::new())
    }

    fn with_machine(hw: MockMachine) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            app: AppService::new(test_config()),
            hw,
            status: StatusLog::new(),
            events: EventLog::new(),
        }
    }

    fn send(&mut self, frame: &str) -> Value {
        let reply = self.dispatcher.handle_frame(
            frame.as_bytes(),
            &mut self.app,
            &mut self.hw,
            &mut self.status,
            &mut self.events,
        );
        serde_json::from_slice(&reply).expect("response is JSON")
    }
}

#[test]
fn cycle_with_capture_answers_uids_and_echoes_transaction() {
    let mut rig = Rig::new();
    rig.hw.queue_scans(&["04a10f", "04a110"]);

    let resp = rig.send(
        r#"{"code":100,"Iter":1,"Floors":["F03","B07"],"OrdersPerFloor":[2,9],"CaptureUids":true,"MaxUids":5,"transaction_id":"9f3ac2e1"}"#,
    );

    assert_eq!(resp["code"], 200);
    assert_eq!(resp["transaction_id"], "9f3ac2e1");
    assert_eq!(resp["uids"], serde_json::json!(["04a10f", "04a110"]));
    assert!(resp.get("text").is_none());
    assert_eq!(rig.app.current_floor(), 3);
}

#[test]
fn numeric_transaction_id_is_echoed_as_number() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":101,"Floor":"B02","transaction_id":42}"#);
    assert_eq!(resp["code"], 200);
    assert_eq!(resp["transaction_id"], 42);
    assert!(resp.get("uids").is_none());
}

#[test]
fn unknown_code_is_404() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":999,"transaction_id":"aa"}"#);
    assert_eq!(resp["code"], 404);
    assert_eq!(resp["transaction_id"], "aa");
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn bad_location_is_406_with_reason() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":101,"Floor":"X03"}"#);
    assert_eq!(resp["code"], 406);
    assert_eq!(resp["text"], "location: unknown side 'X'");
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn reserved_bay_is_406() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":102,"Iter":1,"move_from":["F01"],"move_to":["F05"]}"#);
    assert_eq!(resp["code"], 406);
    assert_eq!(resp["text"], "request: staging bay used as storage location");
}

#[test]
fn malformed_json_is_406() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":100,"Floors":"#);
    assert_eq!(resp["code"], 406);
    assert!(resp["text"].is_string());
    assert!(resp.get("transaction_id").is_none());
}

#[test]
fn short_list_for_iter_is_406() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":100,"Iter":2,"Floors":["F03"],"OrdersPerFloor":[1]}"#);
    assert_eq!(resp["code"], 406);
    assert_eq!(resp["text"], "missing Floors");
}

#[test]
fn stall_is_500() {
    let mut rig = Rig::with_machine(MockMachine::jammed());
    let resp = rig.send(r#"{"code":101,"Floor":"F03","transaction_id":"ab12cd34"}"#);
    assert_eq!(resp["code"], 500);
    assert_eq!(resp["transaction_id"], "ab12cd34");
    assert_eq!(resp["text"], "motion: stall while moving to floor 3");
}

#[test]
fn operator_login_is_tracked_but_not_required() {
    let mut rig = Rig::new();

    let resp = rig.send(r#"{"code":104,"Steps":120,"Up":true}"#);
    assert_eq!(resp["code"], 200);

    let resp = rig.send(r#"{"code":110,"operator_id":"op-17"}"#);
    assert_eq!(resp["code"], 200);
    assert_eq!(rig.dispatcher.operator(), Some("op-17"));

    let resp = rig.send(r#"{"code":120}"#);
    assert_eq!(resp["code"], 200);
    assert_eq!(rig.dispatcher.operator(), None);
    assert_eq!(rig.dispatcher.frames_handled(), 3);
}

#[test]
fn manual_horizontal_defaults_missing_duties_to_neutral() {
    let mut rig = Rig::new();
    let resp = rig.send(r#"{"code":105,"DurationMs":40,"Left":150}"#);
    assert_eq!(resp["code"], 200);
    assert_eq!(rig.hw.drives(), [(150, 90), (90, 90)]);
}

// CMD_CHANNEL / RESP_CHANNEL are process-global; this is the only test in
// the binary that touches them.
#[test]
fn poll_moves_frames_through_channels() {
    let mut rig = Rig::new();
    while channels::try_recv_response().is_some() {}

    assert!(!rig.dispatcher.poll(&mut rig.app, &mut rig.hw, &mut rig.status, &mut rig.events));

    assert!(channels::submit_frame(br#"{"code":103,"transaction_id":"c0ffee00"}"#));
    assert!(rig.dispatcher.poll(&mut rig.app, &mut rig.hw, &mut rig.status, &mut rig.events));

    let reply = channels::try_recv_response().expect("a response was queued");
    let resp: Value = serde_json::from_slice(&reply.data).unwrap();
    assert_eq!(resp["code"], 200);
    assert_eq!(resp["transaction_id"], "c0ffee00");
    assert!(channels::try_recv_response().is_none());
}
