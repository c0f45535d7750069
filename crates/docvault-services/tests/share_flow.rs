//! End-to-end share flow over the in-memory backends
//!
//! Exercises the full path a shared folder travels: folder creation, file
//! upload with the canonical object key, link issuance under the per-tenant
//! lock, anonymous resolution with fresh URLs, and expiry refusal. No
//! database or bucket is required.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use docvault_core::models::{CreateFileRequest, CreateLinkRequest, CreateSmartFolderRequest};
use docvault_core::AppError;
use docvault_db::SmartFolderRepositoryTrait;
use docvault_services::test_helpers::{
    folder_fixture, link_fixture, MockShareLinkRepository, MockSmartFolderRepository,
    MockVaultFileRepository,
};
use docvault_services::{LockRegistry, PublicLinkResolver, ShareLinkService, VaultFileService};
use docvault_storage::{MemoryObjectStore, ObjectStore};
use uuid::Uuid;

#[tokio::test]
async fn share_a_folder_end_to_end() {
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let folders = MockSmartFolderRepository::new();
    let files = MockVaultFileRepository::new();
    let links = MockShareLinkRepository::new(&folders);
    let storage = Arc::new(MemoryObjectStore::new("vault-test"));

    let file_service = VaultFileService::new(
        Arc::new(folders.clone()),
        Arc::new(files.clone()),
        storage.clone(),
    );
    let link_service = ShareLinkService::new(Arc::new(links.clone()), LockRegistry::new());
    let resolver = PublicLinkResolver::new(
        Arc::new(links.clone()),
        Arc::new(files.clone()),
        storage.clone(),
    );

    let folder = folders
        .create_folder(
            tenant_id,
            user_id,
            "bob".to_string(),
            CreateSmartFolderRequest {
                name: "Tax Returns".to_string(),
                description: String::new(),
                category: 2,
                sub_category: 3,
                sort_number: 1,
            },
        )
        .await
        .unwrap();

    let file = file_service
        .create_file(
            tenant_id,
            user_id,
            "bob".to_string(),
            CreateFileRequest {
                name: "2025 return".to_string(),
                description: String::new(),
                filename: "a.pdf".to_string(),
                content_type: String::new(),
                classification: 5,
                smart_folder_id: folder.id,
            },
            Bytes::from_static(b"%PDF-1.4 demo"),
        )
        .await
        .unwrap();

    assert_eq!(
        file.object_key,
        format!("tenant/{}/cat_2/subcat_3/class_5/a.pdf", tenant_id)
    );
    assert!(storage.exists(&file.object_key).await.unwrap());

    let link = link_service
        .create_link(
            tenant_id,
            "Acme".to_string(),
            user_id,
            "bob".to_string(),
            CreateLinkRequest {
                smart_folder_id: folder.id,
                expires_in: 24,
            },
        )
        .await
        .unwrap();
    assert_eq!(link.expiry_date, link.created_at + ChronoDuration::hours(24));

    let view = resolver.resolve(link.id).await.unwrap();
    assert_eq!(view.smart_folder_name, "Tax Returns");
    assert_eq!(view.files.len(), 1);
    assert_eq!(view.files[0].filename, "a.pdf");
    assert!(view.files[0].url.starts_with("memory://"));

    // Resolution never reuses a signature.
    let again = resolver.resolve(link.id).await.unwrap();
    assert_ne!(view.files[0].url, again.files[0].url);

    // A link past its expiry refuses to reveal anything but the instant.
    let expired = link_fixture(tenant_id, folder.id, Utc::now() - ChronoDuration::minutes(1));
    links.add_link(expired.clone());
    let err = resolver.resolve(expired.id).await.unwrap_err();
    assert!(matches!(err, AppError::Expired { .. }));
}

#[tokio::test]
async fn issuance_serializes_within_a_tenant() {
    let tenant_id = Uuid::new_v4();
    let folders = MockSmartFolderRepository::new();
    let folder = folder_fixture(tenant_id, 2, 3);
    folders.add_folder(folder.clone());

    let links =
        MockShareLinkRepository::new(&folders).with_create_delay(Duration::from_millis(25));
    let service = ShareLinkService::new(Arc::new(links.clone()), LockRegistry::new());

    let request = || CreateLinkRequest {
        smart_folder_id: folder.id,
        expires_in: 24,
    };
    let (first, second) = tokio::join!(
        service.create_link(
            tenant_id,
            "Acme".to_string(),
            Uuid::new_v4(),
            "bob".to_string(),
            request(),
        ),
        service.create_link(
            tenant_id,
            "Acme".to_string(),
            Uuid::new_v4(),
            "carol".to_string(),
            request(),
        ),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(links.create_calls(), 2);
    // The per-tenant lock admits one issuance at a time.
    assert_eq!(links.max_concurrent_creates(), 1);
}

#[tokio::test]
async fn issuance_does_not_serialize_across_tenants() {
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let folders = MockSmartFolderRepository::new();
    let folder_a = folder_fixture(tenant_a, 2, 3);
    let folder_b = folder_fixture(tenant_b, 4, 1);
    folders.add_folder(folder_a.clone());
    folders.add_folder(folder_b.clone());

    let links =
        MockShareLinkRepository::new(&folders).with_create_delay(Duration::from_millis(25));
    // One registry shared by both calls, as in a running process.
    let service = ShareLinkService::new(Arc::new(links.clone()), LockRegistry::new());

    let (first, second) = tokio::join!(
        service.create_link(
            tenant_a,
            "Acme".to_string(),
            Uuid::new_v4(),
            "bob".to_string(),
            CreateLinkRequest {
                smart_folder_id: folder_a.id,
                expires_in: 24,
            },
        ),
        service.create_link(
            tenant_b,
            "Globex".to_string(),
            Uuid::new_v4(),
            "carol".to_string(),
            CreateLinkRequest {
                smart_folder_id: folder_b.id,
                expires_in: 12,
            },
        ),
    );
    first.unwrap();
    second.unwrap();

    // Unrelated tenants never contend for the same lock.
    assert_eq!(links.max_concurrent_creates(), 2);
}
