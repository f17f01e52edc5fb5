mod common;

use common::{NoFederation, ProfileDir, StaticFederation};
use cvmforge_auth::{
    AccessConfig, AssumeRoleConfig, AuthError, CredentialResolver, CredentialSource,
    DEFAULT_SESSION_DURATION, Environment,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

fn resolver(env: &[(&str, &str)]) -> CredentialResolver {
    CredentialResolver::new(
        Environment::from_pairs(env.iter().copied()),
        Arc::new(NoFederation),
    )
}

fn access_in(dir: &ProfileDir) -> AccessConfig {
    AccessConfig {
        shared_credentials_dir: Some(dir.path()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_explicit_beats_env_beats_profile() {
    let dir = ProfileDir::new();
    dir.write_credential(
        "default",
        r#"{"secretId": "AKIDprofile", "secretKey": "profile-key"}"#,
    );
    dir.write_configure("default", "ap-shanghai");

    let env = [
        ("TENCENTCLOUD_SECRET_ID", "AKIDenv"),
        ("TENCENTCLOUD_SECRET_KEY", "env-key"),
        ("TENCENTCLOUD_REGION", "ap-tokyo"),
    ];

    let mut access = access_in(&dir);
    access.secret_id = Some("AKIDexplicit".into());

    let resolved = resolver(&env).resolve(&access).await.unwrap();
    assert_eq!(resolved.credential.secret_id, "AKIDexplicit");
    assert_eq!(resolved.credential.secret_key, "env-key");
    assert_eq!(resolved.source, CredentialSource::Explicit);
    assert_eq!(resolved.region, "ap-tokyo");

    let resolved = resolver(&env).resolve(&access_in(&dir)).await.unwrap();
    assert_eq!(resolved.credential.secret_id, "AKIDenv");
    assert_eq!(resolved.source, CredentialSource::Environment);

    let resolved = resolver(&[]).resolve(&access_in(&dir)).await.unwrap();
    assert_eq!(resolved.credential.secret_id, "AKIDprofile");
    assert_eq!(resolved.credential.secret_key, "profile-key");
    assert_eq!(resolved.source, CredentialSource::Profile("default".into()));
    assert_eq!(resolved.region, "ap-shanghai");
}

#[tokio::test]
async fn test_named_profile_from_env() {
    let dir = ProfileDir::new();
    dir.write_credential(
        "ci",
        r#"{"secretId": "AKIDci", "secretKey": "ci-key", "token": "ci-token"}"#,
    );
    dir.write_configure("ci", "ap-singapore");

    let resolved = resolver(&[("TENCENTCLOUD_PROFILE", "ci")])
        .resolve(&access_in(&dir))
        .await
        .unwrap();
    assert_eq!(resolved.credential.secret_id, "AKIDci");
    assert_eq!(resolved.credential.token.as_deref(), Some("ci-token"));
    assert_eq!(resolved.region, "ap-singapore");
}

#[tokio::test]
async fn test_missing_secret_fails_without_profile() {
    let dir = ProfileDir::new();
    let mut access = access_in(&dir);
    access.secret_key = Some("only-the-key".into());
    access.region = Some("ap-guangzhou".into());

    let err = resolver(&[]).resolve(&access).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingField("secret_id")));

    let err = resolver(&[("TENCENTCLOUD_SECRET_ID", "AKIDenv")])
        .resolve(&access_in(&dir))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingField("secret_key")));
}

#[tokio::test]
async fn test_missing_region() {
    let dir = ProfileDir::new();
    let env = [
        ("TENCENTCLOUD_SECRET_ID", "AKIDenv"),
        ("TENCENTCLOUD_SECRET_KEY", "env-key"),
    ];
    let err = resolver(&env).resolve(&access_in(&dir)).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingRegion));
    assert_eq!(err.to_string(), "parameter region must be set");
}

#[tokio::test]
async fn test_mismatched_endpoints_rejected_first() {
    let mut access = AccessConfig {
        vpc_endpoint: Some("vpc.internal".into()),
        ..Default::default()
    };
    access.secret_id = Some("AKID".into());
    let err = resolver(&[]).resolve(&access).await.unwrap_err();
    assert!(matches!(err, AuthError::EndpointMismatch));
}

#[tokio::test]
async fn test_oauth_profile_is_federated() {
    let dir = ProfileDir::new();
    dir.write_credential(
        "default",
        r#"{
            "type": "oauth",
            "oauth": {
                "openId": "open",
                "accessToken": "oauth-access",
                "refreshToken": "refresh",
                "site": "cn"
            }
        }"#,
    );
    dir.write_configure("default", "ap-guangzhou");

    let federation = Arc::new(StaticFederation {
        exchanged: AtomicU32::new(0),
    });
    let resolver = CredentialResolver::new(Environment::default(), federation.clone());
    let resolved = resolver.resolve(&access_in(&dir)).await.unwrap();

    assert_eq!(resolved.credential.secret_id, "AKIDfederated");
    assert_eq!(resolved.credential.token.as_deref(), Some("federated-token"));
    assert_eq!(resolved.source, CredentialSource::Federated("default".into()));
    assert_eq!(federation.exchanged.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_oauth_profile_without_refresh_token() {
    let dir = ProfileDir::new();
    dir.write_credential("default", r#"{"type": "oauth", "oauth": {"openId": "open"}}"#);

    let err = resolver(&[]).resolve(&access_in(&dir)).await.unwrap_err();
    assert!(matches!(err, AuthError::OauthNotConfigured));
}

#[tokio::test]
async fn test_assume_role_chain() {
    let dir = ProfileDir::new();
    dir.write_credential(
        "default",
        r#"{
            "secretId": "AKIDprofile",
            "secretKey": "profile-key",
            "role-arn": "qcs::cam::uin/100:roleName/profile-role",
            "role-session-name": "profile-session",
            "role-session-duration": "1800"
        }"#,
    );
    dir.write_configure("default", "ap-guangzhou");

    let env = [("TENCENTCLOUD_ASSUME_ROLE_SESSION_NAME", "env-session")];
    let resolved = resolver(&env).resolve(&access_in(&dir)).await.unwrap();
    let role = resolved.assume_role.unwrap();
    assert_eq!(role.role_arn, "qcs::cam::uin/100:roleName/profile-role");
    assert_eq!(role.session_name, "env-session");
    assert_eq!(role.session_duration, 1800);
}

#[tokio::test]
async fn test_assume_role_needs_arn_and_session() {
    let mut access = AccessConfig {
        secret_id: Some("AKID".into()),
        secret_key: Some("key".into()),
        region: Some("ap-guangzhou".into()),
        shared_credentials_dir: Some(ProfileDir::new().path()),
        ..Default::default()
    };
    access.assume_role.role_arn = Some("qcs::cam::uin/1:roleName/r".into());
    let resolved = resolver(&[]).resolve(&access).await.unwrap();
    assert!(resolved.assume_role.is_none());

    access.assume_role.session_name = Some("s".into());
    let resolved = resolver(&[]).resolve(&access).await.unwrap();
    assert_eq!(
        resolved.assume_role.unwrap().session_duration,
        DEFAULT_SESSION_DURATION
    );
}

#[tokio::test]
async fn test_session_duration_validation() {
    let base = AccessConfig {
        secret_id: Some("AKID".into()),
        secret_key: Some("key".into()),
        region: Some("ap-guangzhou".into()),
        shared_credentials_dir: Some(ProfileDir::new().path()),
        assume_role: AssumeRoleConfig {
            role_arn: Some("qcs::cam::uin/1:roleName/r".into()),
            session_name: Some("s".into()),
            session_duration: Some(43201),
        },
        ..Default::default()
    };
    let err = resolver(&[]).resolve(&base).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSessionDuration(_)));

    let mut access = base.clone();
    access.assume_role.session_duration = None;
    let err = resolver(&[("TENCENTCLOUD_ASSUME_ROLE_SESSION_DURATION", "two hours")])
        .resolve(&access)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSessionDuration(_)));
}

#[tokio::test]
async fn test_expired_profile_credential_rejected() {
    let dir = ProfileDir::new();
    dir.write_credential(
        "default",
        r#"{"secretId": "AKIDold", "secretKey": "k", "token": "t", "expiresAt": 1000}"#,
    );
    dir.write_configure("default", "ap-guangzhou");

    let err = resolver(&[]).resolve(&access_in(&dir)).await.unwrap_err();
    assert!(matches!(err, AuthError::CredentialExpired(ref from) if from.contains("default")));

    // a secret id from the environment does not inherit the profile expiry
    let env = [
        ("TENCENTCLOUD_SECRET_ID", "AKIDenv"),
        ("TENCENTCLOUD_SECRET_KEY", "env-key"),
    ];
    let resolved = resolver(&env).resolve(&access_in(&dir)).await.unwrap();
    assert_eq!(resolved.credential.secret_id, "AKIDenv");
    assert!(resolved.credential.expires_at.is_none());
}

#[tokio::test]
async fn test_session_duration_ignored_without_role() {
    let access = AccessConfig {
        secret_id: Some("AKID".into()),
        secret_key: Some("key".into()),
        region: Some("ap-guangzhou".into()),
        shared_credentials_dir: Some(ProfileDir::new().path()),
        ..Default::default()
    };
    let resolved = resolver(&[("TENCENTCLOUD_ASSUME_ROLE_SESSION_DURATION", "two hours")])
        .resolve(&access)
        .await
        .unwrap();
    assert!(resolved.assume_role.is_none());
}
