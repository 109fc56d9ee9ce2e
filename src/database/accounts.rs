use async_trait::async_trait;
use sqlx::FromRow;

use crate::auth::Credential;
use crate::database::manager::DatabaseError;
use crate::database::models::{Account, NewAccount};
use crate::database::repository::AccountStore;
use crate::database::transaction::with_transaction;
use crate::database::PgStore;

const ACCOUNT_COLUMNS: &str = "a.account_id AS id, a.firstname, a.lastname, a.username, \
                               a.email, a.phone, a.account_role AS role";

#[derive(FromRow)]
struct AccountCredentialRow {
    id: i32,
    firstname: String,
    lastname: String,
    username: String,
    email: String,
    phone: String,
    role: i32,
    salted_hash: String,
    salt: String,
}

impl From<AccountCredentialRow> for (Account, Credential) {
    fn from(row: AccountCredentialRow) -> Self {
        (
            Account {
                id: row.id,
                firstname: row.firstname,
                lastname: row.lastname,
                username: row.username,
                email: row.email,
                phone: row.phone,
                role: row.role,
            },
            Credential {
                salted_hash: row.salted_hash,
                salt: row.salt,
            },
        )
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(
        &self,
        account: NewAccount,
        credential: Credential,
    ) -> Result<Account, DatabaseError> {
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let created = sqlx::query_as::<_, Account>(
                    "INSERT INTO Account (firstname, lastname, username, email, phone, account_role)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING account_id AS id, firstname, lastname, username, email, phone,
                               account_role AS role",
                )
                .bind(&account.firstname)
                .bind(&account.lastname)
                .bind(&account.username)
                .bind(&account.email)
                .bind(&account.phone)
                .bind(account.role)
                .fetch_one(&mut **tx)
                .await
                .map_err(DatabaseError::classify)?;

                sqlx::query(
                    "INSERT INTO Account_Credential (account_id, salted_hash, salt)
                     VALUES ($1, $2, $3)",
                )
                .bind(created.id)
                .bind(&credential.salted_hash)
                .bind(&credential.salt)
                .execute(&mut **tx)
                .await
                .map_err(DatabaseError::classify)?;

                Ok(created)
            })
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<(Account, Credential)>, DatabaseError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS}, c.salted_hash, c.salt
             FROM Account a
             JOIN Account_Credential c ON c.account_id = a.account_id
             WHERE a.email = $1"
        );
        let row = sqlx::query_as::<_, AccountCredentialRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn credential_for(&self, account_id: i32) -> Result<Option<Credential>, DatabaseError> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT salted_hash, salt FROM Account_Credential WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(salted_hash, salt)| Credential { salted_hash, salt }))
    }

    async fn replace_credential(
        &self,
        account_id: i32,
        credential: Credential,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE Account_Credential SET salted_hash = $1, salt = $2 WHERE account_id = $3",
        )
        .bind(&credential.salted_hash)
        .bind(&credential.salt)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        DatabaseError::expect_rows(1, result.rows_affected())
    }
}
