//! HTTP-level behavior of the classifier, resolver, and collector, exercised
//! against a local mock server. The blocking client runs on the test thread
//! while a multi-thread tokio runtime keeps the mock server alive beside it.

use std::fs;

use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wps_kit::{
    Classifier, Collector, DatasetAccess, DiskFormat, Error, RequestInput, Resolved, Resolver,
    UrlKind,
};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn start_server(rt: &Runtime, mocks: Vec<Mock>) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        for mock in mocks {
            mock.mount(&server).await;
        }
        server
    })
}

struct FixedFormat(DiskFormat);

impl DatasetAccess for FixedFormat {
    fn open_format(&self, _location: &str) -> std::io::Result<DiskFormat> {
        Ok(self.0)
    }
}

struct Unopenable;

impl DatasetAccess for Unopenable {
    fn open_format(&self, location: &str) -> std::io::Result<DiskFormat> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("cannot open {location}"),
        ))
    }
}

#[test]
fn dods_content_description_classifies_as_dap() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![Mock::given(method("HEAD")).respond_with(
            ResponseTemplate::new(200).insert_header("Content-Description", "DODS-DATA"),
        )],
    );

    let classifier = Classifier::new().unwrap();
    assert_eq!(classifier.classify(&server.uri()), UrlKind::Dap);
}

#[test]
fn non_dods_content_description_classifies_as_other() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![Mock::given(method("HEAD")).respond_with(
            ResponseTemplate::new(200).insert_header("Content-Description", "plain file"),
        )],
    );

    let classifier = Classifier::new().unwrap();
    assert_eq!(classifier.classify(&server.uri()), UrlKind::Other);
}

#[test]
fn missing_header_falls_back_to_the_dataset_probe() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![Mock::given(method("HEAD")).respond_with(ResponseTemplate::new(200))],
    );

    let dap = Classifier::with_probe(Box::new(FixedFormat(DiskFormat::Dap2))).unwrap();
    assert_eq!(dap.classify(&server.uri()), UrlKind::Dap);

    let local = Classifier::with_probe(Box::new(FixedFormat(DiskFormat::NetCdf3))).unwrap();
    assert_eq!(local.classify(&server.uri()), UrlKind::Other);

    let broken = Classifier::with_probe(Box::new(Unopenable)).unwrap();
    assert_eq!(broken.classify(&server.uri()), UrlKind::Other);

    let no_probe = Classifier::new().unwrap();
    assert_eq!(no_probe.classify(&server.uri()), UrlKind::Other);
}

#[test]
fn dap_url_resolves_to_itself_without_downloading() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![Mock::given(method("HEAD")).respond_with(
            ResponseTemplate::new(200).insert_header("Content-Description", "dods-dds"),
        )],
    );

    let workdir = tempfile::tempdir().unwrap();
    let url = format!("{}/thredds/dodsC/tasmax.nc", server.uri());
    let resolver = Resolver::new().unwrap();
    let resolved = resolver.resolve(workdir.path(), &url).unwrap();

    assert_eq!(resolved, Resolved::Url(url));
    assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);
}

#[test]
fn http_url_downloads_into_the_workdir() {
    let rt = runtime();
    let body: &[u8] = b"CDF\x01fake netcdf bytes";
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("HEAD")).respond_with(ResponseTemplate::new(200)),
            Mock::given(method("GET"))
                .and(path("/data/sample.nc"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(body)),
        ],
    );

    let workdir = tempfile::tempdir().unwrap();
    let url = format!("{}/data/sample.nc", server.uri());
    let resolver = Resolver::new().unwrap();
    let resolved = resolver.resolve(workdir.path(), &url).unwrap();

    let expected = workdir.path().join("sample.nc");
    assert_eq!(resolved, Resolved::Path(expected.clone()));
    assert_eq!(fs::read(expected).unwrap(), body);
}

#[test]
fn colliding_final_segments_overwrite_the_first_download() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("HEAD")).respond_with(ResponseTemplate::new(200)),
            Mock::given(method("GET"))
                .and(path("/run1/data.nc"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(&b"first"[..])),
            Mock::given(method("GET"))
                .and(path("/run2/data.nc"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(&b"second"[..])),
        ],
    );

    let workdir = tempfile::tempdir().unwrap();
    let resolver = Resolver::new().unwrap();
    resolver
        .resolve(workdir.path(), &format!("{}/run1/data.nc", server.uri()))
        .unwrap();
    resolver
        .resolve(workdir.path(), &format!("{}/run2/data.nc", server.uri()))
        .unwrap();

    // Both URLs end in data.nc, so the second fetch wins.
    assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 1);
    assert_eq!(fs::read(workdir.path().join("data.nc")).unwrap(), b"second");
}

#[test]
fn failed_download_aborts_the_collection() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("HEAD")).respond_with(ResponseTemplate::new(200)),
            Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)),
        ],
    );

    let workdir = tempfile::tempdir().unwrap();
    let url = format!("{}/data/missing.nc", server.uri());
    let inputs = vec![
        RequestInput::literal("argc", 1),
        RequestInput::single("netcdf").remote(&url),
    ];

    let err = Collector::new()
        .unwrap()
        .collect(inputs, workdir.path())
        .unwrap_err();
    assert!(matches!(err, Error::Download { url: u, .. } if u == url));
}

#[test]
fn collects_local_dap_and_literal_inputs_end_to_end() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![Mock::given(method("HEAD")).respond_with(
            ResponseTemplate::new(200).insert_header("Content-Description", "dods-data"),
        )],
    );

    let data = tempfile::tempdir().unwrap();
    let path_a = data.path().join("tasmax_a.nc");
    let path_b = data.path().join("tasmax_b.nc");
    fs::write(&path_a, b"CDF a").unwrap();
    fs::write(&path_b, b"CDF b").unwrap();

    let dap_url = format!("{}/thredds/dodsC/tasmin.nc", server.uri());
    let workdir = tempfile::tempdir().unwrap();
    let inputs = vec![
        RequestInput::new("file1", 2).local(&path_a).local(&path_b),
        RequestInput::single("file2").remote(&dap_url),
        RequestInput::literal("argc", 3),
    ];

    let args = Collector::new()
        .unwrap()
        .collect(inputs, workdir.path())
        .unwrap();

    let order: Vec<&str> = args.identifiers().collect();
    assert_eq!(order, vec!["file1", "file2", "argc"]);

    let file1 = args.get("file1").unwrap().as_multiple().unwrap();
    assert_eq!(file1.len(), 2);
    assert_eq!(file1[0].as_path(), Some(path_a.as_path()));
    assert_eq!(file1[1].as_path(), Some(path_b.as_path()));

    let file2 = args.get("file2").unwrap().as_single().unwrap();
    assert_eq!(file2.as_url(), Some(dap_url.as_str()));

    let argc = args.get("argc").unwrap().as_single().unwrap();
    assert_eq!(argc.as_literal().and_then(|v| v.as_int()), Some(3));

    // The DAP input must not have triggered a download.
    assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);
}

#[test]
fn downloaded_inputs_land_next_to_the_process() {
    let rt = runtime();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("HEAD")).respond_with(ResponseTemplate::new(200)),
            Mock::given(method("GET"))
                .and(path("/fileServer/obs.nc"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(&b"observations"[..])),
        ],
    );

    let workdir = tempfile::tempdir().unwrap();
    let url = format!("{}/fileServer/obs.nc", server.uri());
    let inputs = vec![RequestInput::single("obs").remote(&url)];

    let args = Collector::new()
        .unwrap()
        .collect(inputs, workdir.path())
        .unwrap();

    let resolved = args.get("obs").unwrap().as_single().unwrap();
    let local = resolved.as_path().unwrap();
    assert_eq!(local, workdir.path().join("obs.nc"));
    assert_eq!(fs::read(local).unwrap(), b"observations");
}

#[test]
fn probe_failure_on_the_classifier_is_never_an_error() {
    // No server at all: connection refused within the probe timeout.
    let classifier = Classifier::new().unwrap();
    assert_eq!(classifier.classify("http://127.0.0.1:9/x.nc"), UrlKind::Other);
}
