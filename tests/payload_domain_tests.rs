//! Payload extraction tests over realistic Directum blobs.

use eimzo_signer::domain::{encoding, payload};

/// A Directum signing request as it arrives: surrounding document text with
/// the job object embedded after the marker.
fn directum_blob(issigned: bool, trailer: &str) -> String {
    format!(
        concat!(
            "Документ №42 от 2024-01-15\n",
            "...document body...\n",
            "forsign{{\"address\":\"https://directum.example.uz/\",",
            "\"login\":\"svc-multibank\",\"password\":\"s3cret\",",
            "\"document_id\":31337,\"issigned\":{},\"pkcs7\":\"MIIB=\"}}{}"
        ),
        issigned, trailer
    )
}

#[test]
fn base64_input_carries_the_marker_through() {
    let blob = directum_blob(false, "");
    let wire = encoding::to_base64(blob.as_bytes());

    let decoded = encoding::from_base64(&wire).unwrap();
    let text = String::from_utf8(decoded).unwrap();
    assert!(payload::has_forsign_marker(&text));
}

#[test]
fn job_fields_survive_extraction() {
    let blob = directum_blob(true, " trailing noise after the object");
    let job = payload::extract_signing_job(&blob).unwrap();

    assert_eq!(job.address, "https://directum.example.uz/");
    assert_eq!(job.login, "svc-multibank");
    assert_eq!(job.document_id, 31337);
    assert!(job.issigned);
    assert_eq!(job.pkcs7, "MIIB=");
}

#[test]
fn unsigned_job_payload_is_base64_of_the_raw_field() {
    let blob = directum_blob(false, "");
    let job = payload::extract_signing_job(&blob).unwrap();

    assert!(!job.issigned);
    assert_eq!(job.agent_payload(), encoding::utf8_to_base64("MIIB="));
}

#[test]
fn signed_job_payload_is_passed_through() {
    let blob = directum_blob(true, "");
    let job = payload::extract_signing_job(&blob).unwrap();

    assert_eq!(job.agent_payload(), "MIIB=");
}

#[test]
fn plain_document_has_no_marker() {
    let text = "Договор поставки №7, просто текст без вложенного задания";
    assert!(!payload::has_forsign_marker(text));
    assert!(payload::extract_signing_job(text).is_err());
}
