use snafu::ResultExt;

use crate::Result;
use crate::error::{HttpClientSnafu, HttpResponseParseSnafu};
use dto::user::{AuthTokenDto, CredentialsDto, UserDto, VerifyDto};

use super::{ApiClient, Envelope};

pub async fn login(client: &ApiClient, credentials: &CredentialsDto) -> Result<AuthTokenDto> {
    let response = client
        .post("/api/auth/login")
        .json(credentials)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to login. Try again later.".to_string(),
        })?;

    let response = client.check(response, "login").await?;

    let auth = response
        .json::<Envelope<AuthTokenDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse login response.".to_string(),
        })?;

    Ok(auth.into_inner())
}

pub async fn verify(client: &ApiClient) -> Result<UserDto> {
    let response = client
        .get("/api/auth/verify")
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to verify session. Try again later.".to_string(),
        })?;

    let response = client.check(response, "session").await?;

    let verified = response
        .json::<Envelope<VerifyDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse user information.".to_string(),
        })?;

    Ok(verified.into_inner().user)
}
