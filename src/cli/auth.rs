use crate::{config, error, info, shortener::auth, success, utils, warning};

pub async fn register(name: String, email: String, password: String) {
    let client = super::connect().await;

    let pb = utils::spinner("Creating account...");
    let result = auth::register(&client, &name, &email, &password).await;
    pb.finish_and_clear();

    match result {
        Ok(_) => success!("Account created! Sign in with sorturl auth login."),
        Err(e) => error!("{}", e.user_message("Registration failed")),
    }
}

pub async fn login(email: String, password: String) {
    let client = super::connect().await;

    let pb = utils::spinner("Signing in...");
    let result = auth::login(&client, &email, &password).await;
    pb.finish_and_clear();

    match result {
        Ok(_) => success!("Welcome back!"),
        Err(e) => error!("{}", e.user_message("Invalid credentials")),
    }
}

pub async fn refresh() {
    let client = super::connect().await;

    let pb = utils::spinner("Renewing session...");
    let result = auth::refresh(&client).await;
    pb.finish_and_clear();

    match result {
        Ok(_) => success!("Session renewed."),
        Err(e) => error!("{}", e.user_message("Failed to renew session")),
    }
}

pub async fn logout() {
    let client = super::connect().await;

    match auth::logout(client.session()).await {
        Ok(()) => success!("Signed out."),
        Err(e) => error!("Failed to sign out. Err: {}", e),
    }
}

pub async fn status() {
    let client = super::connect().await;

    info!("Backend: {}", config::api_base_url());
    if client.session().is_authenticated().await {
        success!("Signed in.");
    } else {
        warning!("Not signed in. Run sorturl auth login.");
    }
}
