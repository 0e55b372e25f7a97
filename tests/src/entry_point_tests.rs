use crate::common::{create_new_game, game::CREATE_NEW_GAME, setup, ACCOUNT_DEPOSIT};
use ethers::types::{Address, Bytes, U256};
use warden_entry_point::{EntryPointConfig, EntryPointError, FailureKind, ValidationError};
use warden_primitives::{Event, Wallet};

#[test]
fn stale_nonce_in_batch() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let (account, opponent) = (ctx.account, Address::random());
    let a = ctx.sign(&ctx.avatar, ctx.user_op_at(create_new_game(account, opponent), 0.into()))?;
    let b = ctx.sign(&ctx.avatar, ctx.user_op_at(create_new_game(opponent, account), 0.into()))?;
    let c = ctx.sign(&ctx.avatar, ctx.user_op_at(create_new_game(opponent, opponent), 1.into()))?;

    let beneficiary = Address::random();
    let outcomes = ctx.entry_point.handle_ops(vec![a, b, c], beneficiary);

    assert!(outcomes[0].is_success());
    match outcomes[1].error() {
        Some(EntryPointError::FailedOp {
            index: 1,
            error: ValidationError::InvalidNonce { expected, actual },
        }) => assert_eq!((*expected, *actual), (U256::one(), U256::zero())),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(outcomes[1].error().map(|e| e.kind()), Some(FailureKind::NonceMismatch));
    assert!(outcomes[2].is_success());
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::from(2));

    // games 0 and 1 exist, the rejected operation left no game behind
    assert!(ctx.board(U256::one()).is_ok());
    assert!(ctx.board(U256::from(2)).is_err());

    let paid = outcomes[0].receipt().unwrap().actual_gas_cost +
        outcomes[2].receipt().unwrap().actual_gas_cost;
    assert_eq!(ctx.entry_point.state().balance(&beneficiary), paid);
    assert_eq!(ctx.entry_point.balance_of(&ctx.account), U256::from(ACCOUNT_DEPOSIT) - paid);
    assert!(ctx
        .entry_point
        .state()
        .events()
        .iter()
        .any(|e| matches!(e, Event::ValidationFailed { .. })));
    Ok(())
}

#[test]
fn replayed_operation_is_rejected() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let uo = ctx.sign(&ctx.avatar, ctx.user_op(create_new_game(ctx.account, Address::random())))?;

    assert!(ctx.entry_point.handle_ops(vec![uo.clone()], Address::random())[0].is_success());
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert_eq!(outcomes[0].error().map(|e| e.kind()), Some(FailureKind::NonceMismatch));
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::one());
    Ok(())
}

#[test]
fn operations_in_a_batch_are_isolated() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;
    let opponent = Address::random();

    let uo = ctx.user_op(create_new_game(ctx.account, opponent));
    let stranger = ctx.sign(&Wallet::random(), uo.clone())?;
    let agent = ctx.sign(&ctx.agent, uo)?;
    let outcomes = ctx.entry_point.handle_ops(vec![stranger, agent], Address::random());

    assert_eq!(outcomes[0].error().unwrap().to_string(), "FailedOp(0, \"AA24 signature error\")");
    assert!(outcomes[1].is_success());
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::one());
    assert!(ctx.board(U256::zero())?.player1_turn());
    Ok(())
}

#[test]
fn operation_for_another_chain_is_refused() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let uo = ctx.user_op(create_new_game(ctx.account, Address::random()));
    let uo = ctx.avatar.sign_uo(&uo, &ctx.entry_point.address(), 11155111)?;

    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert!(matches!(
        outcomes[0].error(),
        Some(EntryPointError::FailedOp { error: ValidationError::SignatureFailed { .. }, .. })
    ));
    Ok(())
}

#[test]
fn sponsored_operation() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let signer = Wallet::random();
    let sponsor = Address::random();
    let ep = ctx.entry_point.address();
    let paymaster = ctx.state().deploy_paymaster(sponsor, ep, signer.address());
    ctx.state().fund(sponsor, 2_000_000.into());
    ctx.entry_point.deposit_to(sponsor, paymaster, 2_000_000.into())?;

    let uo = ctx.user_op(create_new_game(ctx.account, Address::random()));
    let pm = ctx.entry_point.state().paymaster(&paymaster).cloned().unwrap();
    let sig = signer.sign_digest(pm.hash(&uo, ctx.entry_point.chain_id(), 0, 0))?;
    let uo = uo.paymaster_and_data(pm.paymaster_and_data(0, 0, &sig));
    let uo = ctx.sign(&ctx.avatar, uo)?;

    let res = ctx.entry_point.simulate_validation(&uo)?;
    assert_eq!(res.paymaster_info.map(|i| i.addr), Some(paymaster));
    assert_eq!(res.return_info.prefund, U256::from(200_000 + 200_000 * 3 + 60_000));

    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    let receipt = outcomes[0].receipt().unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.paymaster, Some(paymaster));
    assert_eq!(ctx.entry_point.balance_of(&ctx.account), ACCOUNT_DEPOSIT.into());
    assert_eq!(
        ctx.entry_point.balance_of(&paymaster),
        U256::from(2_000_000) - receipt.actual_gas_cost
    );
    Ok(())
}

#[test]
fn sponsorship_signed_by_another_key() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let sponsor = Address::random();
    let ep = ctx.entry_point.address();
    let paymaster = ctx.state().deploy_paymaster(sponsor, ep, Address::random());
    ctx.state().fund(sponsor, 2_000_000.into());
    ctx.entry_point.deposit_to(sponsor, paymaster, 2_000_000.into())?;

    let uo = ctx.user_op(create_new_game(ctx.account, Address::random()));
    let pm = ctx.entry_point.state().paymaster(&paymaster).cloned().unwrap();
    let sig = Wallet::random().sign_digest(pm.hash(&uo, ctx.entry_point.chain_id(), 0, 0))?;
    let uo = ctx.sign(&ctx.avatar, uo.paymaster_and_data(pm.paymaster_and_data(0, 0, &sig)))?;

    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert_eq!(
        outcomes[0].error().unwrap().to_string(),
        format!("FailedOp(0, \"{}\")", ValidationError::PaymasterSignatureFailed { paymaster })
    );
    assert_eq!(ctx.entry_point.balance_of(&paymaster), 2_000_000.into());
    Ok(())
}

#[test]
fn account_deployed_by_first_operation() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let owner = Wallet::random();
    let factory = ctx.entry_point.state().factory(&ctx.factory).cloned().unwrap();
    let init_code = factory.init_code(owner.address(), Address::zero(), U256::one());
    let sender = ctx.entry_point.get_sender_address(&init_code)?;
    assert!(!ctx.entry_point.state().is_deployed(&sender));

    let deployer = ctx.deployer;
    ctx.entry_point.deposit_to(deployer, sender, 1_000_000.into())?;

    let uo = ctx
        .user_op(create_new_game(sender, Address::random()))
        .sender(sender)
        .init_code(init_code.clone());
    let uo = ctx.sign(&owner, uo)?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo.clone()], Address::random());

    let receipt = outcomes[0].receipt().unwrap();
    assert!(receipt.success);
    assert!(receipt.logs.iter().any(|e| matches!(
        e,
        Event::AccountDeployed { sender: s, factory: f, .. } if *s == sender && *f == ctx.factory
    )));
    let account = ctx.entry_point.state().account(&sender).unwrap();
    assert_eq!(account.owner(), owner.address());
    assert_eq!(account.get_nonce(), U256::one());

    let again = ctx.sign(&owner, uo.nonce(U256::one()))?;
    let outcomes = ctx.entry_point.handle_ops(vec![again], Address::random());
    match outcomes[0].error() {
        Some(EntryPointError::FailedOp { error, .. }) => assert_eq!(error.code(), "AA10"),
        other => panic!("unexpected outcome {other:?}"),
    }
    Ok(())
}

#[test]
fn estimated_operation_executes() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;

    let uo = ctx
        .user_op(create_new_game(ctx.account, Address::random()))
        .call_gas_limit(U256::zero())
        .verification_gas_limit(U256::zero())
        .pre_verification_gas(U256::zero());
    let est = ctx.entry_point.estimate_user_operation_gas(&uo)?;
    assert!(!est.call_gas_limit.is_zero());

    let uo = uo
        .call_gas_limit(est.call_gas_limit)
        .verification_gas_limit(est.verification_gas_limit)
        .pre_verification_gas(est.pre_verification_gas);
    let uo = ctx.sign(&ctx.agent, uo)?;

    let sim = ctx.entry_point.simulate_handle_op(&uo)?;
    assert!(sim.target_success);
    assert!(sim.call_gas_used <= est.call_gas_limit);

    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert!(outcomes[0].is_success());
    Ok(())
}

#[test]
fn pre_verification_gas_enforced_when_configured() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let config = EntryPointConfig::from_json_str(r#"{"checkPreVerificationGas": true}"#)?;
    let state = ctx.entry_point.state().clone();
    ctx.entry_point = warden_entry_point::EntryPoint::new(config, state);

    let uo = ctx.user_op(create_new_game(ctx.account, Address::random()));
    let low = ctx.sign(&ctx.avatar, uo.clone().pre_verification_gas(1_000.into()))?;
    let outcomes = ctx.entry_point.handle_ops(vec![low], Address::random());
    assert_eq!(outcomes[0].error().map(|e| e.kind()), Some(FailureKind::ResourceExceeded));

    let expected = ctx.entry_point.config().overhead.calculate_pre_verification_gas(&uo);
    // the signature bytes change the calldata cost
    let ok = ctx.sign(&ctx.avatar, uo.pre_verification_gas(expected + 1_000))?;
    assert!(ctx.entry_point.handle_ops(vec![ok], Address::random())[0].is_success());
    Ok(())
}

#[test]
fn withdraw_deposit() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let to = Address::random();
    let account = ctx.account;

    ctx.entry_point.withdraw_to(account, to, 1_000.into())?;
    assert_eq!(ctx.entry_point.state().balance(&to), 1_000.into());
    assert_eq!(ctx.entry_point.balance_of(&account), U256::from(ACCOUNT_DEPOSIT - 1_000));

    assert!(ctx.entry_point.withdraw_to(account, to, ACCOUNT_DEPOSIT.into()).is_err());
    assert!(ctx.entry_point.state().events().iter().any(|e| matches!(
        e,
        Event::Withdrawn { withdraw_address, .. } if *withdraw_address == to
    )));

    let empty = ctx.sign(&ctx.avatar, ctx.user_op(Bytes::default()).call_data(Bytes::default()))?;
    assert!(ctx.entry_point.handle_ops(vec![empty], to)[0].is_success());
    Ok(())
}
