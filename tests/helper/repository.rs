//! Indexed Composer repository served by mockito

use std::path::Path;

use mockito::{Matcher, Mock, ServerGuard};

use super::archive::release_archive;

pub const PACKAGE: &str = "acme/app";

pub struct TestRepository {
    pub server: ServerGuard,
    mocks: Vec<Mock>,
}

impl TestRepository {
    pub async fn start() -> Self {
        Self {
            server: mockito::Server::new_async().await,
            mocks: Vec::new(),
        }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Serve `versions` of the package, each with its own archive.
    ///
    /// `authorization` restricts every endpoint to requests carrying that
    /// header value; requests without the header get a 401.
    pub async fn publish(&mut self, versions: &[&str], authorization: Option<&str>) {
        self.publish_releases(versions, authorization, false).await;
    }

    /// Serve `versions` as GitHub zipballs: the dist url points at
    /// `api.github.com` and every archive entry sits under
    /// `acme-app-<short reference>/`.
    pub async fn publish_zipballs(&mut self, versions: &[&str]) {
        self.publish_releases(versions, None, true).await;
    }

    async fn publish_releases(
        &mut self,
        versions: &[&str],
        authorization: Option<&str>,
        zipball: bool,
    ) {
        let url = self.url();

        let dist_path = |version: &str| {
            if zipball {
                format!("/api.github.com/repos/{}/zipball/{}", PACKAGE, reference(version))
            } else {
                format!("/dist/{}.zip", version)
            }
        };

        let releases: serde_json::Map<String, serde_json::Value> = versions
            .iter()
            .map(|version| {
                (
                    version.to_string(),
                    serde_json::json!({
                        "name": PACKAGE,
                        "version": version,
                        "dist": {
                            "type": "zip",
                            "url": format!("{}{}", url, dist_path(version)),
                            "reference": reference(version),
                        }
                    }),
                )
            })
            .collect();

        let index = serde_json::json!({
            "includes": {
                "include/other.json": {"sha1": "a"},
                "include/all.json": {"sha1": "b"},
            }
        });
        let other = serde_json::json!({"packages": {"acme/other": {}}});
        let all = serde_json::json!({"packages": {(PACKAGE): releases}});

        self.serve("/packages.json", index.to_string().into_bytes(), authorization)
            .await;
        self.serve("/include/other.json", other.to_string().into_bytes(), authorization)
            .await;
        self.serve("/include/all.json", all.to_string().into_bytes(), authorization)
            .await;

        for version in versions {
            let wrapper = zipball.then(|| wrapper_folder(version));
            let archive = release_archive(&url, PACKAGE, version, wrapper.as_deref());
            self.serve(&dist_path(version), archive, authorization).await;
        }
    }

    async fn serve(&mut self, path: &str, body: Vec<u8>, authorization: Option<&str>) {
        let mut mock = self.server.mock("GET", path).with_status(200).with_body(body);
        if let Some(value) = authorization {
            mock = mock.match_header("authorization", value);
            let rejected = self
                .server
                .mock("GET", path)
                .match_header("authorization", Matcher::Missing)
                .with_status(401)
                .create_async()
                .await;
            self.mocks.push(rejected);
        }
        self.mocks.push(mock.create_async().await);
    }
}

/// Commit reference published for `version`
pub fn reference(version: &str) -> String {
    format!("{}0000000000", version.replace('.', ""))
}

/// Top-level folder GitHub puts around a zipball of `version`
pub fn wrapper_folder(version: &str) -> String {
    format!("{}-{}", PACKAGE.replace('/', "-"), &reference(version)[..7])
}

/// Write the installation's own `updater.json`
pub fn write_manifest(dir: &Path, repository_url: &str) {
    let manifest = serde_json::json!({
        "url": repository_url,
        "package": PACKAGE,
        "scripts": [],
    });
    std::fs::write(dir.join("updater.json"), manifest.to_string()).unwrap();
}
