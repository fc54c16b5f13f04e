// src/services/user_directory.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::watch;

use crate::{
    db::{document_store::decode_all, user_repo::USER_SOURCES, Collection, SharedStore},
    models::users::UserProfile,
    services::live::SubscriptionSlot,
};

/// Une `Users` e `newusers` num diretório só.
///
/// União por id; quando o mesmo id existe nas duas coleções, vence o registro
/// escrito por último (`updatedAt`, senão `createdAt`; empate fica com `Users`)
/// e os campos que faltam nele são completados pelo outro.
pub fn merge_users(accounts: &[UserProfile], profiles: &[UserProfile]) -> Vec<UserProfile> {
    let mut merged: Vec<UserProfile> = Vec::with_capacity(accounts.len() + profiles.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for user in accounts.iter().chain(profiles) {
        match index.get(&user.id) {
            Some(&i) => merged[i] = merge_pair(&merged[i], user),
            None => {
                index.insert(user.id.clone(), merged.len());
                merged.push(user.clone());
            }
        }
    }
    merged
}

fn merge_pair(current: &UserProfile, incoming: &UserProfile) -> UserProfile {
    let (winner, other) = if incoming.last_written_at() > current.last_written_at() {
        (incoming, current)
    } else {
        (current, incoming)
    };

    macro_rules! fill {
        ($($field:ident),* $(,)?) => {
            UserProfile {
                id: winner.id.clone(),
                $($field: winner.$field.clone().or_else(|| other.$field.clone()),)*
            }
        };
    }

    fill!(
        name, first_name, last_name, username, email, phone, address, country, image, photo,
        role, is_active, churn_rate, birth_date, age, created_at, updated_at, password_hash,
    )
}

#[derive(Default)]
struct Sources {
    accounts: Vec<UserProfile>,
    profiles: Vec<UserProfile>,
}

// Diretório ao vivo: cada callback guarda o snapshot completo da sua coleção
// e a mesclagem é refeita a partir dos dois, nunca acumulada.
#[derive(Clone)]
pub struct UserDirectory {
    sources: Arc<Mutex<Sources>>,
    merged: Arc<watch::Sender<Arc<Vec<UserProfile>>>>,
    feeds: Arc<Mutex<[SubscriptionSlot; 2]>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        let (merged, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            sources: Arc::new(Mutex::new(Sources::default())),
            merged: Arc::new(merged),
            feeds: Arc::new(Mutex::new(Default::default())),
        }
    }

    pub fn connect(&self, store: SharedStore) {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        for (slot, source) in feeds.iter_mut().zip(USER_SOURCES) {
            let sources = self.sources.clone();
            let merged = self.merged.clone();
            slot.subscribe(store.clone(), source, move |docs| {
                replace_source(&sources, &merged, source, decode_all(source, &docs));
            });
        }
    }

    pub fn disconnect(&self) {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        feeds.iter_mut().for_each(SubscriptionSlot::clear);
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Vec<UserProfile>>> {
        self.merged.subscribe()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_source(
    sources: &Mutex<Sources>,
    merged: &watch::Sender<Arc<Vec<UserProfile>>>,
    source: Collection,
    users: Vec<UserProfile>,
) {
    let mut sources = sources.lock().unwrap_or_else(PoisonError::into_inner);
    match source {
        Collection::NewUsers => sources.profiles = users,
        _ => sources.accounts = users,
    }
    merged.send_replace(Arc::new(merge_users(&sources.accounts, &sources.profiles)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn user(id: &str, name: Option<&str>, email: Option<&str>, updated_day: u32) -> UserProfile {
        UserProfile {
            id: id.into(),
            name: name.map(String::from),
            email: email.map(String::from),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 1, updated_day, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn union_by_id_with_latest_write_winning() {
        let accounts = vec![user("a", Some("Old Name"), Some("a@x.com"), 1), user("b", Some("Bee"), None, 1)];
        let profiles = vec![user("a", Some("New Name"), None, 5), user("c", Some("Cee"), None, 1)];

        let merged = merge_users(&accounts, &profiles);
        assert_eq!(merged.len(), 3);

        let a = merged.iter().find(|u| u.id == "a").unwrap();
        assert_eq!(a.name.as_deref(), Some("New Name"));
        // Campo ausente no vencedor vem do outro registro
        assert_eq!(a.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn ties_keep_the_account_record() {
        let accounts = vec![user("a", Some("Account"), None, 3)];
        let profiles = vec![user("a", Some("Profile"), None, 3)];
        assert_eq!(merge_users(&accounts, &profiles)[0].name.as_deref(), Some("Account"));
    }

    #[test]
    fn repeated_snapshots_never_double_count() {
        let sources = Mutex::new(Sources::default());
        let (merged, _) = watch::channel(Arc::new(Vec::new()));

        let accounts = vec![user("a", None, None, 1)];
        let profiles = vec![user("b", None, None, 1)];
        for _ in 0..3 {
            replace_source(&sources, &merged, Collection::Users, accounts.clone());
            replace_source(&sources, &merged, Collection::NewUsers, profiles.clone());
        }
        assert_eq!(merged.borrow().len(), 2);
    }

    #[tokio::test]
    async fn follows_both_collections() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        store.set(Collection::Users, "a", json!({ "name": "Ada" })).await.unwrap();

        let directory = UserDirectory::new();
        let mut rx = directory.watch();
        directory.connect(store.clone());

        store.set(Collection::NewUsers, "b", json!({ "name": "Bola" })).await.unwrap();

        let both = matches!(
            tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|users| users.len() == 2)).await,
            Ok(Ok(_))
        );
        assert!(both);
        directory.disconnect();
    }
}
